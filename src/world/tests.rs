use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn r1() -> Region {
    Region::new("R1", -400.0, 0.0, -400.0, 0.0)
}

#[test]
fn test_targets_generated_inside_inset_bounds() {
    let mut rng = StdRng::seed_from_u64(7);
    let world = WorldModel::initialize(800.0, vec![r1()], 3, 50.0, &mut rng).unwrap();

    let targets = world.region_targets("R1");
    assert_eq!(targets.len(), 3);
    for target in &targets {
        assert!(target.position.x() >= -350.0 && target.position.x() < -50.0);
        assert!(target.position.z() >= -350.0 && target.position.z() < -50.0);
        assert_eq!(target.position.y(), 0.0);
        assert!(!target.found);
        assert_eq!(target.region, "R1");
    }
}

#[test]
fn test_target_ids_are_deterministic() {
    let regions = vec![
        Region::new("D1", -400.0, 0.0, -400.0, 0.0),
        Region::new("D2", 0.0, 400.0, -400.0, 0.0),
    ];
    let mut rng_a = StdRng::seed_from_u64(1);
    let mut rng_b = StdRng::seed_from_u64(2);

    let a = generate_targets(&regions, 3, 50.0, &mut rng_a).unwrap();
    let b = generate_targets(&regions, 3, 50.0, &mut rng_b).unwrap();

    let ids_a: Vec<&str> = a.iter().map(|t| t.id.as_str()).collect();
    let ids_b: Vec<&str> = b.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids_a, vec!["D1_1", "D1_2", "D1_3", "D2_1", "D2_2", "D2_3"]);
    assert_eq!(ids_a, ids_b);

    assert_eq!(a[0].name, "Target_1");
    assert_eq!(a[5].name, "Target_6");

    // Only coordinates differ between seeds
    assert_ne!(a[0].position, b[0].position);
}

#[test]
fn test_region_too_small_for_margin() {
    let narrow = Region::new("N", 0.0, 90.0, 0.0, 400.0);
    let mut rng = StdRng::seed_from_u64(3);

    let result = WorldModel::initialize(800.0, vec![narrow], 3, 50.0, &mut rng);
    assert_eq!(
        result.unwrap_err(),
        WorldError::RegionTooSmall {
            region: "N".to_string(),
            margin: 50.0
        }
    );
}

#[test]
fn test_region_with_unbounded_extent_rejected() {
    let mut rng = StdRng::seed_from_u64(3);

    // Span overflows even though both bounds are finite
    let huge = Region::new("W", -1e308, 1e308, 0.0, 400.0);
    let result = WorldModel::initialize(800.0, vec![huge], 1, 50.0, &mut rng);
    assert_eq!(
        result.unwrap_err(),
        WorldError::InvalidBounds("W".to_string())
    );

    let open = Region::new("W", f64::NEG_INFINITY, 0.0, 0.0, 400.0);
    let result = WorldModel::initialize(800.0, vec![open], 1, 50.0, &mut rng);
    assert_eq!(
        result.unwrap_err(),
        WorldError::InvalidBounds("W".to_string())
    );

    let nan = Region::new("W", 0.0, 400.0, f64::NAN, 400.0);
    assert!(!nan.has_finite_extent());
}

#[test]
fn test_negative_margin_rejected() {
    let mut rng = StdRng::seed_from_u64(3);
    let result = generate_targets(&[r1()], 1, -5.0, &mut rng);
    assert_eq!(result.unwrap_err(), WorldError::InvalidMargin(-5.0));
}

#[test]
fn test_duplicate_region_rejected() {
    let result = WorldModel::from_targets(800.0, vec![r1(), r1()], Vec::new());
    assert_eq!(
        result.unwrap_err(),
        WorldError::DuplicateRegion("R1".to_string())
    );
}

#[test]
fn test_region_center() {
    let region = Region::new("D3", -400.0, 400.0, 0.0, 400.0);
    assert_eq!(region.center(40.0), Position::new(0.0, 40.0, 200.0));
    assert!(region.has_finite_extent());
}

#[test]
fn test_planar_distance_ignores_altitude() {
    let a = Position::new(0.0, 0.0, 0.0);
    let b = Position::new(3.0, 500.0, 4.0);
    assert_eq!(a.planar_distance(&b), 5.0);
}

#[test]
fn test_position_finite_check() {
    assert!(Position::new(1.0, 2.0, 3.0).is_finite());
    assert!(!Position::new(f64::NAN, 2.0, 3.0).is_finite());
    assert!(!Position::new(1.0, f64::INFINITY, 3.0).is_finite());
}

#[test]
fn test_mark_found_is_one_way() {
    let world = WorldModel::from_targets(
        800.0,
        vec![r1()],
        vec![Target {
            id: "R1_1".to_string(),
            name: "Target_1".to_string(),
            position: Position::new(-200.0, 0.0, -200.0),
            region: "R1".to_string(),
            found: false,
        }],
    )
    .unwrap();

    let slot = world.slots_in("R1").next().unwrap();
    assert!(slot.try_mark_found());
    assert!(!slot.try_mark_found());
    assert!(world.targets()[0].found);
    assert_eq!(world.found_count(), 1);
}

#[test]
fn test_region_deserializes_from_snake_case() {
    let region: Region = toml::from_str(
        r#"
            id = "D1"
            x_from = -400.0
            x_to = 0.0
            z_from = -400.0
            z_to = 0.0
        "#,
    )
    .unwrap();
    assert_eq!(region, Region::new("D1", -400.0, 0.0, -400.0, 0.0));

    let json = serde_json::to_value(&region).unwrap();
    assert_eq!(json["xFrom"], -400.0);
    assert_eq!(json["zTo"], 0.0);
}
