use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::entities::{user, vehicle};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Principal;
use crate::repository::{DynUserRepository, DynVehicleRepository, NewUser, NewVehicle};
use crate::utils::jwt::create_token;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<user::Model> for UserInfo {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddVehicleRequest {
    pub make: String,
    pub model: String,
    pub license_plate: String,
    pub color: Option<String>,
}

pub struct AccountService {
    users: DynUserRepository,
    vehicles: DynVehicleRepository,
    jwt_secret: String,
    jwt_expiration_hours: i64,
}

impl AccountService {
    pub fn new(users: DynUserRepository, vehicles: DynVehicleRepository, config: &Config) -> Self {
        Self {
            users,
            vehicles,
            jwt_secret: config.jwt_secret.clone(),
            jwt_expiration_hours: config.jwt_expiration_hours,
        }
    }

    fn issue(&self, user: user::Model) -> AppResult<AuthResponse> {
        let token = create_token(
            user.id,
            &user.email,
            &self.jwt_secret,
            self.jwt_expiration_hours,
        )?;

        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Register a new account
    pub async fn register(&self, payload: RegisterRequest) -> AppResult<AuthResponse> {
        let email = payload.email.trim().to_lowercase();
        let name = payload.name.trim().to_string();

        if email.is_empty() || name.is_empty() {
            return Err(AppError::BadRequest("Email and name are required".to_string()));
        }
        if payload.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(payload.password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
            .to_string();

        let user = self
            .users
            .create_user(NewUser {
                email,
                password_hash,
                name,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.issue(user)
    }

    /// Login with email and password
    pub async fn login(&self, payload: LoginRequest) -> AppResult<AuthResponse> {
        let email = payload.email.trim().to_lowercase();

        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

        Argon2::default()
            .verify_password(payload.password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::Unauthorized("Invalid email or password".to_string()))?;

        self.issue(user)
    }

    pub async fn add_vehicle(
        &self,
        principal: &Principal,
        payload: AddVehicleRequest,
    ) -> AppResult<vehicle::Model> {
        let driver = self
            .users
            .find_user(principal.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unauthorized: Invalid driver ID".to_string()))?;

        let plate = payload.license_plate.trim().to_uppercase();
        let make = payload.make.trim().to_string();
        let model = payload.model.trim().to_string();
        if plate.is_empty() || make.is_empty() || model.is_empty() {
            return Err(AppError::BadRequest(
                "Make, model and license plate are required".to_string(),
            ));
        }

        if self.vehicles.find_vehicle_by_plate(&plate).await?.is_some() {
            return Err(AppError::Conflict(
                "A vehicle with this license plate is already registered".to_string(),
            ));
        }

        let vehicle = self
            .vehicles
            .create_vehicle(NewVehicle {
                driver_id: driver.id,
                make,
                model,
                license_plate: plate,
                color: payload
                    .color
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
            })
            .await?;

        tracing::info!(vehicle_id = %vehicle.id, driver_id = %driver.id, "Vehicle registered");
        Ok(vehicle)
    }

    pub async fn vehicles(&self, principal: &Principal) -> AppResult<Vec<vehicle::Model>> {
        Ok(self.vehicles.vehicles_for_driver(principal.user_id).await?)
    }
}
