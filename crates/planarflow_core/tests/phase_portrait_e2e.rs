use planarflow_core::geometry::Shape;
use planarflow_core::sampling::{CandidateSampler, InitialValues};
use planarflow_core::settings::{FlowSettings, RenderStyle, Viewport};
use planarflow_core::solvers::Method;
use planarflow_core::traits::{FnField, VectorField};
use planarflow_core::transform::{from_pixel, to_pixel};
use planarflow_core::trajectory_set::TrajectorySet;
use std::f64::consts::PI;
use std::rc::Rc;

fn zero_field() -> Rc<dyn VectorField<f64>> {
    Rc::new(FnField::new(
        |_t: f64, _x: f64, _y: f64| 0.0,
        |_t: f64, _x: f64, _y: f64| 0.0,
    ))
}

fn saddle_field() -> Rc<dyn VectorField<f64>> {
    Rc::new(FnField::new(
        |_t: f64, x: f64, _y: f64| x,
        |_t: f64, x: f64, _y: f64| -x,
    ))
}

fn rotation_field() -> Rc<dyn VectorField<f64>> {
    Rc::new(FnField::new(
        |_t: f64, _x: f64, y: f64| -y,
        |_t: f64, x: f64, _y: f64| x,
    ))
}

fn portrait() -> anyhow::Result<TrajectorySet> {
    Ok(TrajectorySet::new(Viewport::default(), RenderStyle::default())?)
}

#[test]
fn zero_field_is_all_equilibria() -> anyhow::Result<()> {
    let mut set = portrait()?;
    let grid = CandidateSampler::new(1).candidates(
        &InitialValues::range(-2.0, 2.0, 1.0),
        &InitialValues::range(-2.0, 2.0, 1.0),
        set.viewport(),
    )?;
    let report = set.add_candidates(grid, &zero_field(), &FlowSettings::new(1.0, 0.1, "RK4"))?;
    assert_eq!(report.added, 25);

    for trajectory in set.iter() {
        assert!(trajectory.is_equilibrium());
        assert_eq!(trajectory.direction(), trajectory.marker_shape());
    }

    set.advance_animation_frame(3);
    set.on_viewport_change(
        Viewport::new(-4.0, 4.0, -1.0, 1.0, 640.0, 200.0)?,
        RenderStyle::default(),
    )?;
    for trajectory in set.iter() {
        assert_eq!(trajectory.direction(), trajectory.marker_shape());
    }
    Ok(())
}

#[test]
fn saddle_errors_follow_method_order() -> anyhow::Result<()> {
    let exact_x = 1.0_f64.exp();
    let exact_y = 1.0 - exact_x;
    let mut errors = Vec::new();

    for method in Method::ALL {
        let mut set = portrait()?;
        set.add(&[1.0], &[0.0], &saddle_field(), &FlowSettings::new(1.0, 0.01, method.name()))?;
        let series = set
            .get(0)
            .and_then(|t| t.time_series())
            .ok_or_else(|| anyhow::anyhow!("{method} produced no series"))?;
        let (t, x, y) = series.last().ok_or_else(|| anyhow::anyhow!("empty series"))?;
        assert!((t - 1.0).abs() < 1e-12);
        errors.push((x - exact_x).abs().max((y - exact_y).abs()));
    }

    let (euler, rk2, rk4) = (errors[0], errors[1], errors[2]);
    assert!(euler < 2e-2, "euler error {euler}");
    assert!(rk2 < 1e-4, "rk2 error {rk2}");
    assert!(rk4 < 1e-8, "rk4 error {rk4}");
    assert!(rk4 * 100.0 < rk2 && rk2 * 100.0 < euler);
    Ok(())
}

#[test]
fn circular_orbit_closes_under_rk4() -> anyhow::Result<()> {
    let mut set = portrait()?;
    let settings = FlowSettings::new(2.0 * PI, PI / 100.0, "RK4");
    set.add(&[1.0], &[0.0], &rotation_field(), &settings)?;

    let trajectory = set.trajectory_at(1.0, 0.0).ok_or_else(|| anyhow::anyhow!("missing"))?;
    assert!(!trajectory.is_equilibrium());
    assert_eq!(trajectory.path().len(), 201);

    let end = trajectory.path()[200];
    assert!((end.x - 1.0).abs() < 1e-6, "x end {}", end.x);
    assert!(end.y.abs() < 1e-6, "y end {}", end.y);
    assert!(matches!(trajectory.direction(), Shape::Triangle(_)));
    Ok(())
}

#[test]
fn repeated_initial_condition_is_stored_once() -> anyhow::Result<()> {
    let mut set = portrait()?;
    let settings = FlowSettings::default();
    set.add(&[0.5], &[0.5], &rotation_field(), &settings)?;
    let report = set.add(&[0.5, 0.5], &[0.5], &rotation_field(), &settings)?;
    assert_eq!(report.added, 0);
    assert_eq!(report.duplicates, 2);
    assert_eq!(set.len(), 1);
    Ok(())
}

#[test]
fn unknown_method_adds_nothing() -> anyhow::Result<()> {
    let mut set = portrait()?;
    let err = set
        .add(&[1.0, 2.0], &[0.0], &rotation_field(), &FlowSettings::new(1.0, 0.1, "Verlet"))
        .expect_err("unknown method");
    assert!(err.to_string().contains("Verlet"));
    assert!(set.is_empty());
    Ok(())
}

#[test]
fn animation_ends_where_it_started() -> anyhow::Result<()> {
    let mut set = portrait()?;
    set.add(&[1.0, 2.0], &[0.0], &rotation_field(), &FlowSettings::new(1.0, 0.05, "RK2"))?;
    let before = set.markers();

    let longest = set.iter().map(|t| t.path().len()).max().unwrap_or(0);
    for frame in 0..longest {
        set.advance_animation_frame(frame);
    }
    assert_ne!(set.markers(), before);

    set.advance_animation_frame(longest);
    assert_eq!(set.markers(), before);
    assert_eq!(set.animation_frame_count(), longest + 1);
    Ok(())
}

#[test]
fn refitting_twice_gives_identical_geometry() -> anyhow::Result<()> {
    let mut set = portrait()?;
    set.add(&[1.0, -3.0], &[0.0, 2.0], &saddle_field(), &FlowSettings::new(1.0, 0.01, "RK4"))?;

    let viewport = Viewport::new(-5.0, 25.0, -60.0, 10.0, 1024.0, 300.0)?;
    let style = RenderStyle {
        marker_diameter_px: 14.0,
        arrowhead_size_px: 6.0,
    };
    set.on_viewport_change(viewport, style)?;
    let (markers, directions) = (set.markers(), set.directions());
    set.on_viewport_change(viewport, style)?;
    assert_eq!(set.markers(), markers);
    assert_eq!(set.directions(), directions);
    Ok(())
}

#[test]
fn pixel_round_trip_holds_across_scales() {
    for &(size, min, max) in &[(800.0, -10.0, 10.0), (37.0, 1e-3, 2e-3), (4096.0, -1e6, 5.0)] {
        for k in 0..=20 {
            let p = size * k as f64 / 20.0;
            let back = to_pixel(from_pixel(p, size, min, max), size, min, max);
            assert!((back - p).abs() <= 1e-9 * size, "p {p} back {back}");
        }
    }
}
