use odata_domain::entity::Entity;
use odata_macros::entity;

#[entity(kind = "user")]
pub struct User {
    pub first_name: String,
    pub phone: Option<String>,
}

fn main() {
    assert_eq!(User::KIND, "user");
    assert_eq!(User::DESCRIPTORS.len(), 2);

    let user = User {
        id: 1,
        audit: Default::default(),
        first_name: "Ann".into(),
        phone: None,
    };
    assert_eq!(user.id(), 1);
}
