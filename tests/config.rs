use bevy_autodrive::{AutodriveConfig, AutodriveConfigError};

#[test]
fn default_config_is_valid() {
    assert_eq!(AutodriveConfig::default().validate(), Ok(()));
}

#[test]
fn validation_names_the_offending_field() {
    let cases: [(&str, fn(&mut AutodriveConfig)); 6] = [
        ("free_distance", |config| config.free_distance = 0.0),
        ("max_ray_distance", |config| config.max_ray_distance = -1.0),
        ("side_ray_angle", |config| config.side_ray_angle = 95.0),
        ("ray_height", |config| config.ray_height = f32::INFINITY),
        ("turning_speed", |config| config.turning_speed = -0.5),
        ("stop_distance", |config| config.stop_distance = f32::NAN),
    ];
    for (field, break_config) in cases {
        let mut config = AutodriveConfig::default();
        break_config(&mut config);
        let err: AutodriveConfigError = config.validate().unwrap_err();
        assert_eq!(err.field, field);
        assert!(err.to_string().contains(field), "{err}");
    }
}

#[test]
fn boundary_values_are_accepted() {
    let config = AutodriveConfig {
        side_ray_angle: 90.0,
        ray_height: -0.3,
        acceleration: 0.0,
        caution_distance: 0.0,
        ..Default::default()
    };
    assert_eq!(config.validate(), Ok(()));
}

#[cfg(feature = "serialize")]
mod serialize {
    use bevy_autodrive::{AutodriveConfig, AutodriveError};

    #[test]
    fn load_from_ron() {
        let config =
            AutodriveConfig::from_ron_str("(free_distance: 12.0, decceleration: 3.0)").unwrap();
        assert_eq!(config.free_distance, 12.0);
        assert_eq!(config.deceleration, 3.0);
        assert_eq!(config.max_speed, AutodriveConfig::default().max_speed);

        let config = AutodriveConfig::from_ron_str("(deceleration: 2.0)").unwrap();
        assert_eq!(config.deceleration, 2.0);
    }

    #[test]
    fn round_trip_through_ron() {
        let config = AutodriveConfig {
            max_ray_distance: 25.0,
            ..Default::default()
        };
        let serialized = ron::to_string(&config).expect("Unable to serialize the configuration");
        assert_eq!(AutodriveConfig::from_ron_str(&serialized).unwrap(), config);
    }

    #[test]
    fn invalid_ron_is_rejected() {
        assert!(matches!(
            AutodriveConfig::from_ron_str("(side_ray_angle: 180.0)"),
            Err(AutodriveError::InvalidConfiguration(ref err)) if err.field == "side_ray_angle"
        ));
        let Err(AutodriveError::ConfigParse(err)) =
            AutodriveConfig::from_ron_str("(\n    max_speed: 4.0,\n    free_distance: \"far\",\n)")
        else {
            panic!("Expected a parse error");
        };
        assert_eq!(err.position.line, 3);
        assert!(err.to_string().contains("3:"), "{err}");
    }
}
