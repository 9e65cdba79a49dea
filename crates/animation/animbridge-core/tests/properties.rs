use animbridge_core::{
    channel::classify,
    config::ConvertConfig,
    control_vars::{effect_float, ControllerClass, ShaderFamily},
    curve::{Curve, CurveKey},
    data::FloatKey,
    export::{export_animations, sequence::sequence_cyclic},
    graph::CycleType,
    naming::{make_name, parse_name},
    rotation::{apply_bind, quat_from_euler, remove_bind},
    tangent::{to_handles, to_tangents},
    timeline::Timeline,
    ControlledElement, SceneRegistry,
};
use approx::assert_abs_diff_eq;
use indexmap::IndexMap;

fn curve_key(k0: Option<&FloatKey>, k1: &FloatKey, k2: Option<&FloatKey>, fps: f64) -> CurveKey {
    let (handle_left, handle_right) = to_handles(k0, k1, k2, fps);
    CurveKey {
        frame: k1.time * fps + 1.0,
        value: k1.value,
        handle_left,
        handle_right,
    }
}

#[test]
fn tangent_round_trip_interior() {
    let fps = 30.0;
    let keys = [
        FloatKey::quadratic(0.0, 1.0, 0.7, -0.25),
        FloatKey::quadratic(0.4, 2.5, 1.75, -3.5),
        FloatKey::quadratic(1.3, -0.5, 0.125, 4.0),
    ];
    let ck: Vec<CurveKey> = (0..3usize)
        .map(|i| {
            let prev = i.checked_sub(1).map(|p| &keys[p]);
            curve_key(prev, &keys[i], keys.get(i + 1), fps)
        })
        .collect();
    let (f, b) = to_tangents(Some(&ck[0]), &ck[1], Some(&ck[2]));
    assert_abs_diff_eq!(f, 1.75, epsilon = 1e-6);
    assert_abs_diff_eq!(b, -3.5, epsilon = 1e-6);
}

#[test]
fn tangent_round_trip_boundaries() {
    let fps = 24.0;
    let first = FloatKey::quadratic(0.0, 0.0, 0.9, 2.0);
    let last = FloatKey::quadratic(2.0, 1.0, -1.5, 0.3);

    let k_first = curve_key(None, &first, Some(&last), fps);
    let k_last = curve_key(Some(&first), &last, None, fps);

    let (f, b) = to_tangents(None, &k_first, Some(&k_last));
    assert_abs_diff_eq!(f, 0.9, epsilon = 1e-6);
    assert_abs_diff_eq!(b, 2.0, epsilon = 1e-6);

    let (f, b) = to_tangents(Some(&k_first), &k_last, None);
    assert_abs_diff_eq!(f, -1.5, epsilon = 1e-6);
    assert_abs_diff_eq!(b, 0.3, epsilon = 1e-6);

    // a lone key has neither neighbor
    let lone = FloatKey::quadratic(0.5, 4.0, -0.2, 0.6);
    let k = curve_key(None, &lone, None, fps);
    let (f, b) = to_tangents(None, &k, None);
    assert_abs_diff_eq!(f, -0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(b, 0.6, epsilon = 1e-6);
}

#[test]
fn rotation_round_trip() {
    let binds = [
        quat_from_euler([0.0, 0.0, 0.0]),
        quat_from_euler([0.3, -1.2, 2.9]),
        quat_from_euler([std::f64::consts::FRAC_PI_2, 0.0, 0.0]),
    ];
    let keys = [
        quat_from_euler([0.1, 0.2, 0.3]),
        quat_from_euler([-2.0, 1.4, 0.0]),
        quat_from_euler([3.1, 0.0, -3.1]),
    ];
    for b in &binds {
        for q in &keys {
            let back = apply_bind(b, &remove_bind(b, q));
            assert!(back.angle_to(q) < 1e-4, "bind {b:?} key {q:?}");
        }
    }
}

fn keyed(name: &str, times: (f64, f64), cyclic: bool, cfg: &ConvertConfig) -> Timeline {
    let path = r#"nodes["Skyrim Shader - Effect"].inputs["Emission Strength"].default_value"#;
    let mut c = Curve::new(path, 0);
    c.insert(CurveKey::flat(cfg.frame_of(times.0), 0.0));
    c.insert(CurveKey::flat(cfg.frame_of(times.1), 1.0));
    Timeline::new(name).with_curve(c).with_cyclic(cyclic)
}

#[test]
fn sequence_time_bounds_span_members() {
    let cfg = ConvertConfig::default();
    let scene = SceneRegistry::new()
        .with(ControlledElement::node("A").with_shader(ShaderFamily::Effect))
        .with(ControlledElement::node("B").with_shader(ShaderFamily::Effect));
    let a = keyed("ANIM|Glow|A|Shader", (0.0, 2.5), true, &cfg);
    let b = keyed("ANIM|Glow|B|Shader", (0.5, 3.0), true, &cfg);
    let ea = scene.iter().find(|e| e.name == "A").unwrap();
    let eb = scene.iter().find(|e| e.name == "B").unwrap();

    let mut anims = IndexMap::new();
    anims.insert("Glow".to_string(), vec![(&a, ea), (&b, eb)]);
    let report = export_animations(&anims, &scene, &cfg).unwrap();
    let seq = &report.graph.sequences[0];
    assert_abs_diff_eq!(seq.start_time, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(seq.stop_time, 3.0, epsilon = 1e-9);
    assert_eq!(seq.cycle_type, CycleType::Loop);
    assert_eq!(seq.controlled_blocks.len(), 2);

    let c = &report.graph.controllers[0];
    assert_eq!(c.class, ControllerClass::ScalarProperty(ShaderFamily::Effect));
    assert_eq!(c.controlled_variable, Some(effect_float::EMISSIVE_MULTIPLE));
    assert_abs_diff_eq!(c.stop_time, 2.5, epsilon = 1e-9);
}

#[test]
fn name_round_trip_with_embedded_separator() {
    let name = make_name("Walk", "Bone|L_Arm", Some("Shader"));
    assert_eq!(name, "ANIM|Walk|Bone||L_Arm|Shader");
    let (anim, target, sub) = parse_name(&name).unwrap();
    assert_eq!(anim, "Walk");
    assert_eq!(target, "Bone|L_Arm");
    assert_eq!(sub, "Shader");
}

#[test]
fn classifier_is_deterministic() {
    let paths = [
        r#"nodes["Skyrim Shader - TSN"].inputs["Glossiness"].default_value"#,
        r#"nodes["UV Converter"].inputs["Offset U"].default_value"#,
        r#"nodes["Alpha Threshold"].outputs[0].default_value"#,
        r#"pose.bones["Bip01 Head"].rotation_quaternion"#,
        "location",
    ];
    let first: Vec<_> = paths
        .iter()
        .map(|p| classify(p, Some(ShaderFamily::Lighting)).unwrap().kind.controller())
        .collect();
    for _ in 0..3 {
        for (i, p) in paths.iter().enumerate().rev() {
            let again = classify(p, Some(ShaderFamily::Lighting)).unwrap().kind.controller();
            assert_eq!(again, first[i], "{p}");
        }
    }
    assert_eq!(
        first[2],
        Some((ControllerClass::AlphaThreshold, Some(effect_float::ALPHA_TRANSPARENCY)))
    );
}

#[test]
fn cyclic_inference_is_conservative() {
    let cfg = ConvertConfig::default();
    let t: Vec<Timeline> = [true, true, false]
        .iter()
        .enumerate()
        .map(|(i, &c)| keyed(&format!("ANIM|Hit|E{i}"), (0.0, 1.0), c, &cfg))
        .collect();
    let refs: Vec<&Timeline> = t.iter().collect();
    assert!(!sequence_cyclic(&refs));
    assert!(sequence_cyclic(&refs[..2]));
}
