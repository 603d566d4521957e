use csv_user_loader::{
    assembler::assemble_content,
    pipeline::prepare_users,
    record::{FlatRecord, NestedRecord, NestedValue, PersistableUser, build_nested, separate},
};

fn leaf(value: &str) -> NestedValue {
    NestedValue::Leaf(value.to_string())
}

#[test]
fn dot_paths_expand_into_mandatory_fields() {
    let flat: FlatRecord = [
        ("name.firstName", "John"),
        ("name.lastName", "Doe"),
        ("age", "25"),
        ("address.city", "NYC"),
    ]
    .into_iter()
    .collect();

    let user = separate(&build_nested(&flat));

    let mut address = NestedRecord::new();
    address.insert("city".to_string(), leaf("NYC"));
    assert_eq!(
        user,
        PersistableUser {
            name: "John Doe".to_string(),
            age: 25,
            address: Some(NestedValue::Branch(address)),
            additional_info: None,
        }
    );
}

#[test]
fn transforms_are_idempotent() {
    let flat: FlatRecord = [
        ("name.firstName", "Ada"),
        ("age", "36abc"),
        ("meta", "x"),
        ("meta.source", "import"),
        ("tags.primary", "math"),
    ]
    .into_iter()
    .collect();

    let first = separate(&build_nested(&flat));
    let second = separate(&build_nested(&flat));
    assert_eq!(first, second);
    assert_eq!(first.age, 36);
}

#[test]
fn bare_address_column_is_kept_as_leaf() {
    let flat: FlatRecord = [("address", "221B Baker St"), ("age", "")].into_iter().collect();
    let user = separate(&build_nested(&flat));
    assert_eq!(user.address, Some(leaf("221B Baker St")));
    assert_eq!(user.age, 0);
    assert_eq!(user.name, "");
}

#[test]
fn short_rows_never_reach_the_transform() {
    let assembly = assemble_content("a,b,c\n1,2\n").expect("assemble");
    assert!(assembly.records.is_empty());
    assert_eq!(assembly.skipped.len(), 1);
}

#[test]
fn prepare_users_trims_values_and_headers() {
    let content = " name.firstName , age ,address.zip,hobby\r\n  Grace ,  85,\"02139\", \"chess, go\" \n";
    let (users, skipped) = prepare_users(content).expect("prepare");
    assert!(skipped.is_empty());
    assert_eq!(users.len(), 1);
    let user = &users[0];
    assert_eq!(user.name, "Grace");
    assert_eq!(user.age, 85);
    let extra = user.additional_info.as_ref().expect("hobby");
    assert_eq!(extra["hobby"], leaf("chess, go"));
}
