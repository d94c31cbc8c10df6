use chrono::{DateTime, Utc};
use odata_domain::entity::Entity;
use odata_macros::entity;

#[entity]
#[derive(serde::Serialize, PartialEq)]
struct Address {
    street: String,
    #[field(rename = "zip")]
    zip_code: i32,
    #[field(requires_role = "Admin")]
    verified: bool,
    #[field(skip)]
    cached_label: String,
    verified_at: Option<DateTime<Utc>>,
}

fn main() {
    assert_eq!(Address::KIND, "address");
    let names: Vec<_> = Address::DESCRIPTORS.iter().map(|d| d.name).collect();
    assert_eq!(names, ["street", "zip", "verified", "verifiedAt"]);
}
