use grid_particles::error::{SettingsError, SimError};
use grid_particles::frame_clock::FrameClock;
use grid_particles::settings::{HostSettings, ParticleCount, RotationMode, SimulationSettings};

#[test]
fn defaults_are_valid() {
    let settings = SimulationSettings::default();
    settings.validate().unwrap();
    assert_eq!(settings.particle_count, 1024);
    assert_eq!(settings.grid_dimensions, [8, 8, 8]);
    assert_eq!(settings.interaction_radius(), 1.0);
}

#[test]
fn partial_ron_keeps_defaults_for_missing_fields() {
    let settings = SimulationSettings::from_ron_str(
        r#"(
            particle_count: 4096,
            grid_dimensions: (16, 8, 16),
            cell_size: (0.5, 0.5, 0.5),
            particle_radius: 0.2,
            rotation_mode: External,
            seed: Some(42),
            host: (ticks: 10),
        )"#,
    )
    .unwrap();

    assert_eq!(settings.particle_count, 4096);
    assert_eq!(settings.grid_dimensions, [16, 8, 16]);
    assert_eq!(settings.rotation_mode, RotationMode::External);
    assert_eq!(settings.seed, Some(42));
    assert_eq!(settings.host.ticks, 10);
    assert_eq!(settings.host.stats_interval, 60);
    assert_eq!(settings.world_bounds, [10.0; 3]);
}

#[test]
fn malformed_ron_is_a_parse_error() {
    let result = SimulationSettings::from_ron_str("(particle_count: \"many\")");
    assert!(matches!(result, Err(SettingsError::Ron(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = SimulationSettings::load("does/not/exist.ron");
    assert!(matches!(result, Err(SettingsError::Io(_))));
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        SimulationSettings { grid_dimensions: [0, 4, 4], ..Default::default() },
        SimulationSettings { cell_size: [1.0, -1.0, 1.0], ..Default::default() },
        SimulationSettings { particle_radius: -0.1, ..Default::default() },
        SimulationSettings { max_velocity: f32::NAN, ..Default::default() },
        SimulationSettings { damping: -1.0, ..Default::default() },
        SimulationSettings { restitution: 1.5, ..Default::default() },
        SimulationSettings { stencil_radius_cells: 0, ..Default::default() },
        SimulationSettings { world_bounds: [10.0, 0.0, 10.0], ..Default::default() },
        SimulationSettings { external_velocity: [f32::INFINITY, 0.0, 0.0], ..Default::default() },
        SimulationSettings { host: HostSettings { fixed_delta_time: Some(-0.5), ..Default::default() }, ..Default::default() },
        SimulationSettings { host: HostSettings { fixed_delta_time: Some(1.0e30), ..Default::default() }, ..Default::default() },
    ];
    for settings in cases {
        assert!(settings.validate().is_err(), "{settings:?} should be rejected");
    }
}

#[test]
fn validation_errors_surface_through_the_loader() {
    let result = SimulationSettings::from_ron_str("(stencil_radius_cells: 0)");
    assert!(matches!(
        result,
        Err(SettingsError::Invalid(SimError::InvalidSetting { name: "stencil_radius_cells", .. }))
    ));
}

#[test]
fn oversized_fixed_step_is_rejected_before_the_clock_is_built() {
    let result = SimulationSettings::from_ron_str("(host: (fixed_delta_time: Some(1e30)))");
    assert!(matches!(
        result,
        Err(SettingsError::Invalid(SimError::InvalidSetting { name: "host.fixed_delta_time", .. }))
    ));
    assert!(FrameClock::from_settings(Some(1.0e30)).is_err());

    let settings = SimulationSettings::from_ron_str("(host: (fixed_delta_time: Some(0.02)))").unwrap();
    let mut clock = FrameClock::from_settings(settings.host.fixed_delta_time).unwrap();
    assert!((clock.tick().0 - 0.02).abs() < 1e-6);
}

#[test]
fn particle_count_presets_are_powers_of_two() {
    for preset in [ParticleCount::P16, ParticleCount::P1024, ParticleCount::P2097152] {
        assert!(u32::from(preset).is_power_of_two());
    }
    assert_eq!(u32::from(ParticleCount::P2097152), 2_097_152);
}
