use printqueue_rs::queue::material::{TEXT_DARK, TEXT_LIGHT, TRANSPARENT};
use printqueue_rs::{active_profile, Percent, SetModel, SetRecord};

fn set_with(record: SetRecord) -> SetModel {
    let (_tx, rx) = active_profile(Some("MK3S".to_string()));
    SetModel::new(record, rx).unwrap()
}

#[test]
fn test_materials_view() {
    let mut record = SetRecord::new("a.gcode", 1);
    record.materials = vec!["PETG_Red_FF0000".into(), "".into(), "PLA_White_FFFFFF".into()];
    let view = set_with(record).materials_view();

    assert_eq!(view.len(), 3);
    assert_eq!(view[0].title, "PETG (Red)");
    assert_eq!(view[0].short_name, "G");
    assert_eq!(view[0].bg_color, "FF0000");
    assert_eq!(view[0].color, TEXT_LIGHT);

    assert_eq!(view[1].title, "any");
    assert_eq!(view[1].short_name, " ");
    assert_eq!(view[1].color, TRANSPARENT);
    assert_eq!(view[1].bg_color, TRANSPARENT);

    assert_eq!(view[2].short_name, "P");
    assert_eq!(view[2].color, TEXT_DARK);
}

#[test]
fn test_set_material_normalizes() {
    let mut record = SetRecord::new("a.gcode", 1);
    record.materials = vec!["PLA".into(), "".into(), "".into()];
    let mut set = set_with(record);
    set.set_material(0, "Any");
    assert!(set.materials().is_empty());

    set.set_material(1, "ABS_Blue_0000FF");
    assert_eq!(set.materials(), ["", "ABS_Blue_0000FF"]);
    set.set_material(3, "Any");
    assert_eq!(set.materials(), ["", "ABS_Blue_0000FF"]);
}

#[test]
fn test_profiles() {
    let mut set = set_with(SetRecord::new("a.gcode", 1));
    assert!(set.profile_matches());

    assert!(set.add_profile("MINI"));
    assert!(!set.add_profile("MINI"));
    assert_eq!(set.profiles(), ["MINI"]);
    assert!(!set.profile_matches());

    set.add_profile("MK3S");
    assert!(set.profile_matches());

    assert!(set.remove_profile("MK3S"));
    assert!(!set.remove_profile("MK3S"));
    assert!(!set.profile_matches());
    set.remove_profile("MINI");
    assert!(set.profile_matches());
}

#[test]
fn test_no_active_profile_only_matches_unrestricted_sets() {
    let (_tx, rx) = active_profile(None);
    let mut record = SetRecord::new("a.gcode", 1);
    record.profiles = vec!["MK3S".into()];
    assert!(!SetModel::new(record, rx.clone()).unwrap().profile_matches());
    assert!(SetModel::new(SetRecord::new("b.gcode", 1), rx).unwrap().profile_matches());
}

#[test]
fn test_metadata_passes_through_unchanged() {
    let raw = r#"{ "layers": 120,  "note": "keep spacing" }"#;
    let mut record = SetRecord::new("a.gcode", 2);
    record.metadata = Some(raw.to_string());
    let mut set = set_with(record);
    assert_eq!(set.metadata().unwrap()["layers"], 120);

    set.set_material(0, "PLA_Black_000000");
    set.add_profile("MINI");
    let out = set.serialize();
    assert_eq!(out.metadata.as_deref(), Some(raw));
    assert_eq!(out.materials, vec!["PLA_Black_000000"]);
    assert_eq!(out.profiles, vec!["MINI"]);
}

#[test]
fn test_progress_with_indeterminate_remaining() {
    let mut set = set_with(SetRecord::new("a.gcode", 4));
    set.set_completed(3);
    set.set_remaining(Some(1));
    assert_eq!(set.percent_complete(), Percent::Value(75));
    assert_eq!(set.progress_text(), "3/4");

    set.set_remaining_input("x");
    assert_eq!(set.percent_complete(), Percent::Indeterminate);
    assert_eq!(set.percent_active(), Percent::Indeterminate);
    assert_eq!(set.length_remaining(Some(2)), None);
}

#[test]
fn test_zero_total_is_sentinel() {
    let mut record = SetRecord::new("a.gcode", 0);
    record.remaining = Some(0);
    record.completed = Some(0);
    let set = set_with(record);
    assert_eq!(set.percent_complete(), Percent::Indeterminate);
    assert_eq!(set.percent_complete().to_string(), "—");
    assert_eq!(set.percent_active(), Percent::Indeterminate);
}
