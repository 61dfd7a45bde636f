//! Inbound request objects and their validation tables.
//!
//! Fields are optional at the wire level so that a missing value is reported
//! by the `required` rule rather than by the JSON decoder. Capitalised
//! aliases keep older clients that send `Name`/`Password` working.

use serde::Deserialize;

use crate::db::{Feature, NewProduct};
use crate::validate::{Field, Rule, Validate, Value};

const MIN_PASSWORD_LENGTH: f64 = 6.0;
const MAX_DESCRIPTION_LENGTH: f64 = 100.0;
const MIN_FEATURES: f64 = 2.0;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRequest {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Password")]
    pub password: Option<String>,
}

impl Validate for UserRequest {
    const NAME: &'static str = "user_request";

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("name", Value::text(self.name.as_deref())).rules([
                Rule::Required,
                Rule::NotBlank,
                Rule::Email,
                Rule::Unique {
                    table: "users",
                    column: "name",
                },
            ]),
            Field::new("password", Value::text(self.password.as_deref()))
                .rules([
                    Rule::Required,
                    Rule::NotBlank,
                    Rule::Min(MIN_PASSWORD_LENGTH),
                ])
                .secret(),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "UserName")]
    pub user_name: Option<String>,
    #[serde(alias = "Password")]
    pub password: Option<String>,
}

impl Validate for LoginRequest {
    const NAME: &'static str = "auth_request";

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("user_name", Value::text(self.user_name.as_deref())).rules([
                Rule::Required,
                Rule::NotBlank,
                Rule::Email,
            ]),
            Field::new("password", Value::text(self.password.as_deref()))
                .rules([
                    Rule::Required,
                    Rule::NotBlank,
                    Rule::Min(MIN_PASSWORD_LENGTH),
                ])
                .secret(),
        ]
    }
}

/// The token may come in the body or, failing that, from the session cookie.
/// An absent token is not a validation error; authentication reports it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReAuthRequest {
    #[serde(alias = "Token")]
    pub token: Option<String>,
}

impl Validate for ReAuthRequest {
    const NAME: &'static str = "re_auth_request";

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("token", Value::text(self.token.as_deref()))
                .rules([Rule::NotBlank])
                .secret(),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRequest {
    #[serde(alias = "Name")]
    pub name: Option<String>,
}

impl Validate for CategoryRequest {
    const NAME: &'static str = "category_request";

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("name", Value::text(self.name.as_deref())).rules([
                Rule::Required,
                Rule::NotBlank,
                Rule::Unique {
                    table: "categories",
                    column: "name",
                },
            ]),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureRequest {
    #[serde(rename = "type", alias = "Type")]
    pub kind: Option<String>,
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Details")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRequest {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Price")]
    pub price: Option<f64>,
    #[serde(alias = "Amount")]
    pub amount: Option<i64>,
    #[serde(alias = "Features")]
    pub features: Option<Vec<FeatureRequest>>,
    #[serde(alias = "Desc")]
    pub desc: Option<String>,
    #[serde(alias = "CategoryID")]
    pub category_id: Option<String>,
}

impl Validate for ProductRequest {
    const NAME: &'static str = "product_request";

    fn fields(&self) -> Vec<Field<'_>> {
        let mut fields = vec![
            Field::new("name", Value::text(self.name.as_deref()))
                .rules([Rule::Required, Rule::NotBlank]),
            Field::new("price", Value::number(self.price)).rules([Rule::Required, Rule::Gt(0.0)]),
            Field::new("amount", Value::integer(self.amount))
                .rules([Rule::Required, Rule::Gte(0.0)]),
            Field::new("features", Value::list(self.features.as_deref()))
                .rules([Rule::Required, Rule::Min(MIN_FEATURES)]),
        ];

        for (i, feature) in self.features.iter().flatten().enumerate() {
            fields.push(
                Field::new(format!("features[{}].type", i), Value::text(feature.kind.as_deref()))
                    .rules([Rule::Required, Rule::NotBlank]),
            );
            fields.push(
                Field::new(format!("features[{}].name", i), Value::text(feature.name.as_deref()))
                    .rules([Rule::Required, Rule::NotBlank]),
            );
        }

        fields.push(
            Field::new("desc", Value::text(self.desc.as_deref()))
                .rules([Rule::Required, Rule::Max(MAX_DESCRIPTION_LENGTH)]),
        );
        fields.push(
            Field::new("category_id", Value::text(self.category_id.as_deref())).rules([
                Rule::Required,
                Rule::NotBlank,
                Rule::Exists {
                    table: "categories",
                    column: "id",
                },
            ]),
        );
        fields
    }
}

impl From<ProductRequest> for NewProduct {
    fn from(request: ProductRequest) -> Self {
        Self {
            name: request.name.unwrap_or_default(),
            price: request.price.unwrap_or_default(),
            amount: request.amount.unwrap_or_default(),
            description: request.desc.unwrap_or_default(),
            category_id: request.category_id.unwrap_or_default(),
            features: request
                .features
                .unwrap_or_default()
                .into_iter()
                .map(|feature| Feature {
                    kind: feature.kind.unwrap_or_default(),
                    name: feature.name.unwrap_or_default(),
                    details: feature.details.unwrap_or_default(),
                })
                .collect(),
        }
    }
}
