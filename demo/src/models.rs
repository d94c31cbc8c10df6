use chrono::{DateTime, Utc};
use odata_macros::{entity, enumeration};

#[enumeration]
pub enum Role {
    User,
    Admin,
}

#[enumeration]
pub enum AddressType {
    Home,
    Work,
}

#[entity(kind = "user")]
pub struct User {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    /// 仅管理员可修改
    #[field(requires_role = "Admin")]
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    pub role: Role,
}

#[entity(kind = "address")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub address_type: AddressType,
}
