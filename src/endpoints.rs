//! One function per use case, plus the `Endpoints` facade that runs each of
//! them behind its pipeline.
//!
//! The free functions assume their request already passed validation. Store
//! constraints still back the uniqueness and foreign key rules, and a write
//! rejected by one is reported as the matching validation failure.

use std::sync::Arc;

use tracing::info;

use crate::auth::AuthService;
use crate::db::{Database, NewProduct, is_foreign_key_violation, is_unique_violation};
use crate::error::{AppError, FieldViolation, ResultExt};
use crate::jwt::{IssuedToken, JwtConfig};
use crate::password::hash_password;
use crate::pipeline::{AuthStage, Envelope, Pipeline, ValidationStage};
use crate::requests::{CategoryRequest, LoginRequest, ProductRequest, ReAuthRequest, UserRequest};
use crate::validate::{Validate, Validator};

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn write_error<R: Validate>(e: sqlx::Error, field: &str, value: &str, context: &str) -> AppError {
    let path = format!("{}.{}", R::NAME, field);
    if is_unique_violation(&e) {
        AppError::validation(FieldViolation::new(path, "should_be_unique", value))
    } else if is_foreign_key_violation(&e) {
        AppError::validation(FieldViolation::new(path, "should_exist", value))
    } else {
        AppError::internal(context, e)
    }
}

/// Register a user and return its id.
pub async fn create_user(db: &Database, request: UserRequest) -> Result<String, AppError> {
    let name = request.name.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    let hash = hash_password(&password)
        .await
        .internal("Failed to hash password")?;

    let id = new_id();
    db.users()
        .create(&id, &name, &hash)
        .await
        .map_err(|e| write_error::<UserRequest>(e, "name", &name, "Failed to create user"))?;

    info!(user = %id, "User created");
    Ok(id)
}

pub async fn create_category(db: &Database, request: CategoryRequest) -> Result<String, AppError> {
    let name = request.name.unwrap_or_default();

    let id = new_id();
    db.categories().create(&id, &name).await.map_err(|e| {
        write_error::<CategoryRequest>(e, "name", &name, "Failed to create category")
    })?;

    info!(category = %id, "Category created");
    Ok(id)
}

/// Store a product and its features atomically and return its id.
pub async fn create_product(db: &Database, request: ProductRequest) -> Result<String, AppError> {
    let product = NewProduct::from(request);

    let id = new_id();
    db.products().create(&id, &product).await.map_err(|e| {
        write_error::<ProductRequest>(
            e,
            "category_id",
            &product.category_id,
            "Failed to create product",
        )
    })?;

    info!(product = %id, features = product.features.len(), "Product created");
    Ok(id)
}

pub async fn login(auth: &AuthService, request: LoginRequest) -> Result<IssuedToken, AppError> {
    let user_name = request.user_name.unwrap_or_default();
    let password = request.password.unwrap_or_default();
    auth.authenticate(&user_name, &password).await
}

pub async fn reauth(auth: &AuthService, request: ReAuthRequest) -> Result<IssuedToken, AppError> {
    auth.reauthenticate(request.token.as_deref())
}

/// Every endpoint wired to its stage chain.
#[derive(Clone)]
pub struct Endpoints {
    db: Database,
    auth: AuthService,
    users: Pipeline<UserRequest>,
    categories: Pipeline<CategoryRequest>,
    products: Pipeline<ProductRequest>,
    logins: Pipeline<LoginRequest>,
    reauths: Pipeline<ReAuthRequest>,
}

impl Endpoints {
    pub fn new(db: Database, jwt: Arc<JwtConfig>) -> Self {
        let validator = Validator::new(Arc::new(db.clone()));
        let auth = AuthService::new(db.clone(), jwt);

        let validated = || ValidationStage::new(validator.clone());
        let authenticated = || AuthStage::new(auth.clone());

        Self {
            users: Pipeline::new().stage(validated()),
            categories: Pipeline::new().stage(validated()).stage(authenticated()),
            products: Pipeline::new().stage(validated()).stage(authenticated()),
            logins: Pipeline::new().stage(validated()),
            reauths: Pipeline::new().stage(validated()),
            db,
            auth,
        }
    }

    pub async fn create_user(
        &self,
        envelope: &Envelope,
        request: UserRequest,
    ) -> Result<String, AppError> {
        self.users
            .run(envelope, request, |r| create_user(&self.db, r))
            .await
    }

    pub async fn create_category(
        &self,
        envelope: &Envelope,
        request: CategoryRequest,
    ) -> Result<String, AppError> {
        self.categories
            .run(envelope, request, |r| create_category(&self.db, r))
            .await
    }

    pub async fn create_product(
        &self,
        envelope: &Envelope,
        request: ProductRequest,
    ) -> Result<String, AppError> {
        self.products
            .run(envelope, request, |r| create_product(&self.db, r))
            .await
    }

    pub async fn login(
        &self,
        envelope: &Envelope,
        request: LoginRequest,
    ) -> Result<IssuedToken, AppError> {
        self.logins
            .run(envelope, request, |r| login(&self.auth, r))
            .await
    }

    /// A token missing from the body is taken from the envelope.
    pub async fn reauth(
        &self,
        envelope: &Envelope,
        mut request: ReAuthRequest,
    ) -> Result<IssuedToken, AppError> {
        if request.token.is_none() {
            request.token = envelope.session_token().map(str::to_string);
        }
        self.reauths
            .run(envelope, request, |r| reauth(&self.auth, r))
            .await
    }
}
