use crate::models::{Address, AddressType, Role, User};
use chrono::{TimeZone, Utc};

fn user(first: &str, last: &str, role: Role, born: (i32, u32, u32)) -> User {
    User {
        id: 0,
        audit: Default::default(),
        first_name: first.to_string(),
        middle_name: None,
        last_name: last.to_string(),
        email: format!("{}.{}@contoso.com", first.to_lowercase(), last.to_lowercase()),
        phone: None,
        birth_date: Utc.with_ymd_and_hms(born.0, born.1, born.2, 0, 0, 0).single(),
        role,
    }
}

fn address(street: &str, city: &str, state: &str, zip: &str, kind: AddressType) -> Address {
    Address {
        id: 0,
        audit: Default::default(),
        street: street.to_string(),
        city: city.to_string(),
        state: state.to_string(),
        zip_code: zip.to_string(),
        address_type: kind,
    }
}

pub fn users() -> Vec<User> {
    vec![
        user("Ada", "Lovelace", Role::Admin, (1815, 12, 10)),
        user("Alan", "Turing", Role::User, (1912, 6, 23)),
        user("Grace", "Hopper", Role::User, (1906, 12, 9)),
    ]
}

pub fn addresses() -> Vec<Address> {
    vec![
        address("1 Microsoft Way", "Redmond", "WA", "98052", AddressType::Work),
        address("12 Elm St", "Springfield", "IL", "62701", AddressType::Home),
        address("500 Pine St", "Seattle", "WA", "98101", AddressType::Home),
    ]
}

/// 初始关联：(用户标识, 地址标识)
pub fn links() -> Vec<(i32, i32)> {
    vec![(1, 1), (1, 2), (2, 1), (3, 3)]
}
