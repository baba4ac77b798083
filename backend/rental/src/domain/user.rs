use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub address: Option<Json<Address>>,
    pub role: Role,
    pub license_number: String,
    pub license_expiry: NaiveDate,
    pub bookings: Vec<Uuid>,
    pub wishlist: Vec<Uuid>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration data after the password has been hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<Address>,
    pub license_number: String,
    pub license_expiry: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub license_number: Option<String>,
    pub license_expiry: Option<NaiveDate>,
}

/// Fields an admin may change on another account.
#[derive(Debug, Clone, Default)]
pub struct AdminUserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_verified: Option<bool>,
}

/// The caller of an operation, resolved from the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.id == owner_id || self.is_admin()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    pub fn new(new_user: NewUser, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: new_user.name.trim().to_string(),
            email: normalize_email(&new_user.email),
            password_hash,
            phone: new_user.phone,
            address: new_user.address.map(Json),
            role: Role::User,
            license_number: new_user.license_number,
            license_expiry: new_user.license_expiry,
            bookings: Vec::new(),
            wishlist: Vec::new(),
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role,
        }
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            self.email = normalize_email(&email);
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(address) = update.address {
            self.address = Some(Json(address));
        }
        if let Some(license_number) = update.license_number {
            self.license_number = license_number;
        }
        if let Some(license_expiry) = update.license_expiry {
            self.license_expiry = license_expiry;
        }
        self.updated_at = Utc::now();
    }

    pub fn apply_admin_update(&mut self, update: AdminUserUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            self.email = normalize_email(&email);
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(is_verified) = update.is_verified {
            self.is_verified = is_verified;
        }
        self.updated_at = Utc::now();
    }

    pub fn has_in_wishlist(&self, car_id: Uuid) -> bool {
        self.wishlist.contains(&car_id)
    }
}
