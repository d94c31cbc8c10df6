use odata_domain::coercion::{FieldCodec, FieldValue};
use odata_domain::schema::FieldType;
use odata_macros::enumeration;

#[enumeration]
pub enum AddressType {
    Home,
    Work,
}

fn main() {
    assert_eq!(AddressType::VARIANTS, &["Home", "Work"]);
    assert_eq!(AddressType::FIELD_TYPE, FieldType::Enum(&["Home", "Work"]));
    assert_eq!(AddressType::Work.encode(), FieldValue::Enum("Work"));
    assert_eq!(AddressType::Home.to_string(), "Home");
    let decoded = AddressType::decode("addressType", FieldValue::Enum("Home")).unwrap();
    assert_eq!(decoded, AddressType::Home);
}
