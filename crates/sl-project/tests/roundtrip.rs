use sl_project::schema::*;
use sl_project::{
    build_block, build_generator, load_yaml, read_input_file, read_loop_file, save_yaml,
    validate_scenario, write_input_file, write_loop_file,
};

fn reference_scenario() -> Scenario {
    Scenario {
        version: 1,
        name: "Reference loop".to_string(),
        control_loop: BlockDef::Loop {
            closed: true,
            init_val: 0.0,
            children: vec![
                BlockDef::Pid {
                    k: 0.4,
                    ti: 2.0,
                    td: 0.0,
                },
                BlockDef::Arx {
                    coeff_a: vec![-0.4],
                    coeff_b: vec![0.6],
                    delay: 1,
                    stddev: 0.0,
                    seed: Some(1),
                },
            ],
        },
        input: Some(GeneratorDef::Pwm {
            amplitude: 0.75,
            period: 8,
            duty_cycle: 0.25,
            t_start: 1,
            t_end: 16,
            inner: Box::new(GeneratorDef::Base {
                value: 1.0,
                t_start: 0,
                t_end: 0,
            }),
        }),
        steps: 30,
    }
}

#[test]
fn roundtrip_yaml_scenario() {
    let scenario = reference_scenario();
    validate_scenario(&scenario).unwrap();

    let path = std::env::temp_dir().join("sl_project_roundtrip.yaml");
    save_yaml(&path, &scenario).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(scenario, loaded);
}

#[test]
fn loaded_scenario_builds_and_runs() {
    let path = std::env::temp_dir().join("sl_project_build_run.yaml");
    save_yaml(&path, &reference_scenario()).unwrap();
    let scenario = load_yaml(&path).unwrap();

    let mut block = build_block(&scenario.control_loop).unwrap();
    let mut input = build_generator(scenario.input.as_ref().unwrap()).unwrap();
    let out: Vec<f64> = (0..scenario.steps as i32)
        .map(|t| {
            let sp = input.simulate(t);
            block.simulate(sp)
        })
        .collect();
    assert_eq!(out.len(), 30);
    assert!(out.iter().all(|v| v.is_finite()));
}

#[test]
fn loop_blob_file_round_trip() {
    let block = build_block(&reference_scenario().control_loop).unwrap();
    let path = std::env::temp_dir().join("sl_project_loop.lmod");
    write_loop_file(&path, block.as_ref()).unwrap();
    let restored = read_loop_file(&path).unwrap();
    assert!(block.eq_block(restored.as_ref()));
}

#[test]
fn input_blob_file_round_trip() {
    let scenario = reference_scenario();
    let generator = build_generator(scenario.input.as_ref().unwrap()).unwrap();
    let path = std::env::temp_dir().join("sl_project_input.gens");
    write_input_file(&path, generator.as_ref()).unwrap();
    let restored = read_input_file(&path).unwrap();
    assert!(generator.eq_gen(restored.as_ref()));
}

#[test]
fn invalid_scenario_refuses_to_save() {
    let mut scenario = reference_scenario();
    scenario.control_loop = BlockDef::Loop {
        closed: true,
        init_val: 0.0,
        children: vec![],
    };
    let path = std::env::temp_dir().join("sl_project_invalid.yaml");
    assert!(save_yaml(&path, &scenario).is_err());
}
