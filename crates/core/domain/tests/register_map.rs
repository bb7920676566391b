use domain::{
    BlockSpec, DeviceTarget, FieldSpec, FunctionCode, InvalidTarget, RegisterKind, RegisterMap,
    RegisterMapError,
};

fn temperature(id: &str, address: u16) -> FieldSpec {
    FieldSpec::new(id, id.to_uppercase(), address)
        .with_scale(0.1)
        .expect("scale")
}

#[test]
fn block_layout_covers_every_register() {
    let block = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        154,
        175 - 154 + 2,
        vec![
            temperature("extruder", 154),
            temperature("pulling", 165),
            temperature("t1", 175),
        ],
    )
    .expect("block");

    assert_eq!(block.layout().len(), 1 + 23);
    assert_eq!(block.layout(), format!(">{}", "h".repeat(23)));
    assert_eq!(block.end(), 177);
    assert_eq!(block.offset_of(&block.fields()[1]), 11);
}

#[test]
fn block_layout_uses_field_kind_and_pads_with_int16() {
    let block = BlockSpec::new(
        FunctionCode::ReadHoldingRegisters,
        10,
        4,
        vec![
            FieldSpec::new("b", "B", 12).with_kind(RegisterKind::Uint16),
            FieldSpec::new("a", "A", 10).with_kind(RegisterKind::Uint16),
        ],
    )
    .expect("block");

    // 字段顺序与地址顺序无关
    assert_eq!(block.layout(), ">HhHh");
    assert_eq!(block.fields()[0].id(), "b");
}

#[test]
fn block_rejects_address_outside_span() {
    let err = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        12,
        10,
        vec![temperature("t2", 112)],
    )
    .expect_err("out of block");
    assert_eq!(
        err,
        RegisterMapError::AddressOutOfBlock {
            field_id: "t2".to_string(),
            address: 112,
            start: 12,
            end: 22,
        }
    );
}

#[test]
fn block_rejects_empty_span_and_conflicting_kinds() {
    let err = BlockSpec::new(FunctionCode::ReadInputRegisters, 1, 0, Vec::new())
        .expect_err("empty");
    assert!(matches!(err, RegisterMapError::InvalidBlock { .. }));

    let err = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        1,
        1,
        vec![
            FieldSpec::new("signed", "Signed", 1),
            FieldSpec::new("unsigned", "Unsigned", 1).with_kind(RegisterKind::Uint16),
        ],
    )
    .expect_err("conflict");
    assert_eq!(err, RegisterMapError::ConflictingKind(1));
}

#[test]
fn register_map_rejects_duplicate_ids_across_blocks() {
    let first = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        1,
        1,
        vec![FieldSpec::new("counter", "Counter", 1)],
    )
    .expect("block");
    let second = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        5,
        1,
        vec![FieldSpec::new("counter", "Counter again", 5)],
    )
    .expect("block");

    let err = RegisterMap::new(vec![first, second]).expect_err("duplicate");
    assert_eq!(err, RegisterMapError::DuplicateField("counter".to_string()));
}

#[test]
fn register_map_iterates_fields_in_order() {
    let first = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        1,
        1,
        vec![FieldSpec::new("counter", "Counter", 1).with_kind(RegisterKind::Uint16)],
    )
    .expect("block");
    let second = BlockSpec::new(
        FunctionCode::ReadInputRegisters,
        20,
        3,
        vec![temperature("t2", 22), temperature("t1", 20)],
    )
    .expect("block");
    let map = RegisterMap::new(vec![first, second]).expect("map");

    let ids: Vec<&str> = map.fields().map(|field| field.id()).collect();
    assert_eq!(ids, vec!["counter", "t2", "t1"]);
    assert_eq!(map.field_count(), 3);
    assert_eq!(map.find_field("t1").map(|field| field.address()), Some(20));
    assert!(map.find_field("missing").is_none());
}

#[test]
fn device_target_defaults_port() {
    let target = DeviceTarget::parse("192.168.0.15").expect("target");
    assert_eq!(target, DeviceTarget::new("192.168.0.15", 502));

    let target = DeviceTarget::parse("192.168.0.16:5204").expect("target");
    assert_eq!(target.port, 5204);
    assert_eq!(target.to_string(), "192.168.0.16:5204");
}

#[test]
fn device_target_rejects_bad_port() {
    assert_eq!(
        DeviceTarget::parse("plc:abc"),
        Err(InvalidTarget("plc:abc".to_string()))
    );
    assert!(DeviceTarget::parse("plc:").is_err());
    assert!(DeviceTarget::parse(":502").is_err());
}
