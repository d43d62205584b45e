use material_export::asset_graph::{AssetGraph, ObjectId};
use material_export::config::ExportConfig;
use material_export::session::ExportSession;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn session_config(out: &Path) -> ExportConfig {
    ExportConfig {
        out_dir: out.to_path_buf(),
        ..ExportConfig::default()
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("reading {}: {}", path.display(), e))
        .lines()
        .map(str::to_string)
        .collect()
}

const WALL: &str = r#"{"objects": [
    {"id": 1, "class": "Texture2D", "name": "Wall_D", "width": 1, "height": 1,
     "payload": {"data": [10, 20, 30, 255]}},
    {"id": 2, "class": "Texture2D", "name": "Rock_N"},
    {"id": 3, "class": "Texture2D", "name": "Moss"},
    {"id": 4, "class": "Texture2D", "name": {"bytes": [66, 97, 100], "readable": 2}},
    {"id": 5, "class": "Texture2D", "name": "Noise_Tile"},
    {"id": 10, "class": "Material3", "name": "M_Wall",
     "params": {"Diffuse": 1},
     "textures": [1, 4],
     "referenced_textures": [2, 3],
     "expressions": [
        {"kind": "MaterialExpressionTextureSampleParameter2D", "parameter_name": "BaseNormal", "texture": 2},
        {"kind": "MaterialExpressionAdd"},
        null,
        {"kind": "MaterialExpressionTextureSampleParameter2D", "parameter_name": "None", "texture": 3},
        {"kind": "MaterialExpressionTextureSampleParameter2D", "parameter_name": "DetailNoise", "texture": 5}
     ],
     "properties": {"TwoSided": true, "BlendMode": "BLEND_Masked", "OpacityMaskClipValue": 0.33}}
]}"#;

#[test]
fn material_sidecar_lines_and_order() {
    let dir = tempdir().unwrap();
    let graph = AssetGraph::from_json(WALL).unwrap();
    let mut session = ExportSession::new(&graph, session_config(dir.path()));
    session.export_named("M_Wall").unwrap();
    let report = session.finish();
    assert!(report.failures.is_empty(), "{:?}", report.failures);

    let mat = read_lines(&dir.path().join("Material3/M_Wall.mat"));
    assert_eq!(
        mat,
        vec![
            "Diffuse=Wall_D",
            "Diffuse=Wall_D",
            "BaseNormal=Rock_N",
            "DetailNoise=Noise_Tile",
        ]
    );

    let props = read_lines(&dir.path().join("Material3/M_Wall.props.txt"));
    assert_eq!(
        props,
        vec![
            "BlendMode = BLEND_Masked",
            "OpacityMaskClipValue = 0.33",
            "TwoSided = true",
        ]
    );
}

#[test]
fn corrupt_texture_name_is_exported_once_without_a_line() {
    let dir = tempdir().unwrap();
    let graph = AssetGraph::from_json(WALL).unwrap();
    let mut session = ExportSession::new(&graph, session_config(dir.path()));
    session.export_object(ObjectId(10));
    session.export_object(ObjectId(4));
    let report = session.finish();

    // material + five textures
    assert_eq!(report.objects_exported, 6);
    let fallback = dir.path().join("Texture2D/Texture2D_4.texture.json");
    assert!(fallback.is_file());
    assert_eq!(
        report
            .files
            .iter()
            .filter(|f| f.ends_with("Texture2D_4.texture.json"))
            .count(),
        1
    );
    let mat = read_lines(&dir.path().join("Material3/M_Wall.mat"));
    assert_eq!(mat.len(), 4);
    assert!(mat.iter().all(|l| !l.ends_with("=Ba")));
    assert!(dir.path().join("Texture2D/Wall_D.png").is_file());
}

#[test]
fn round_trip_canonical_only_fixture() {
    let dir = tempdir().unwrap();
    let graph = AssetGraph::from_json(
        r#"{"objects": [
            {"id": 1, "class": "Texture2D", "name": "Wall_D"},
            {"id": 2, "class": "Texture2D", "name": "Trim"},
            {"id": 9, "class": "Material", "name": "M_Plain",
             "params": {"Diffuse": 1}, "textures": [2, 1]}
        ]}"#,
    )
    .unwrap();
    let mut session = ExportSession::new(&graph, session_config(dir.path()));
    session.export_all_materials();
    session.finish();

    let mat = read_lines(&dir.path().join("Material/M_Plain.mat"));
    assert_eq!(mat, vec!["Diffuse=Wall_D", "Other[0]=Trim", "Diffuse=Wall_D"]);
}

const CHAIN: &str = r#"{"objects": [
    {"id": 1, "class": "Texture2D", "name": "Base_D"},
    {"id": 2, "class": "Texture2D", "name": "Mid_N"},
    {"id": 3, "class": "Texture2D", "name": "Top_MASK"},
    {"id": 10, "class": "Material", "name": "M_Base", "textures": [1]},
    {"id": 11, "class": "MaterialInstanceConstant", "name": "MI_Mid", "parent": 10,
     "texture_parameters": [{"name": "MidNormal", "texture": 2}]},
    {"id": 12, "class": "MaterialInstanceConstant", "name": "MI_Top", "parent": 11,
     "texture_parameters": [{"name": "TopMask", "texture": 3}]}
]}"#;

#[test]
fn instance_chain_exports_every_level() {
    let dir = tempdir().unwrap();
    let graph = AssetGraph::from_json(CHAIN).unwrap();
    let mut session = ExportSession::new(&graph, session_config(dir.path()));
    session.export_named("MI_Top").unwrap();
    let report = session.finish();
    assert_eq!(report.materials_exported, 3);
    // three materials + three textures
    assert_eq!(report.objects_exported, 6);

    let top = read_lines(&dir.path().join("MaterialInstanceConstant/MI_Top.mat"));
    assert_eq!(top, vec!["Mask=Top_MASK", "Normal=Mid_N", "Diffuse=Base_D"]);
    let mid = read_lines(&dir.path().join("MaterialInstanceConstant/MI_Mid.mat"));
    assert_eq!(mid, vec!["Normal=Mid_N", "Diffuse=Base_D"]);
    let base = read_lines(&dir.path().join("Material/M_Base.mat"));
    assert_eq!(base, vec!["Diffuse=Base_D"]);
    for name in ["MaterialInstanceConstant/MI_Top", "MaterialInstanceConstant/MI_Mid", "Material/M_Base"] {
        assert!(dir.path().join(format!("{}.props.txt", name)).is_file(), "{}", name);
    }
}

#[test]
fn parent_depth_cap_stops_recursion() {
    let dir = tempdir().unwrap();
    let graph = AssetGraph::from_json(CHAIN).unwrap();
    let cfg = ExportConfig {
        max_parent_depth: 1,
        ..session_config(dir.path())
    };
    let mut session = ExportSession::new(&graph, cfg);
    session.export_named("MI_Top").unwrap();
    let report = session.finish();
    assert_eq!(report.materials_exported, 2);
    assert!(!dir.path().join("Material/M_Base.mat").exists());
}

#[test]
fn cyclic_parents_terminate() {
    let dir = tempdir().unwrap();
    let graph = AssetGraph::from_json(
        r#"{"objects": [
            {"id": 1, "class": "MaterialInstanceConstant", "name": "MI_A", "parent": 2},
            {"id": 2, "class": "MaterialInstanceConstant", "name": "MI_B", "parent": 1}
        ]}"#,
    )
    .unwrap();
    let mut session = ExportSession::new(&graph, session_config(dir.path()));
    session.export_all_materials();
    let report = session.finish();
    assert_eq!(report.materials_exported, 2);
    assert!(report.failures.is_empty());
}

#[test]
fn props_can_be_disabled() {
    let dir = tempdir().unwrap();
    let graph = AssetGraph::from_json(CHAIN).unwrap();
    let cfg = ExportConfig {
        write_props: false,
        ..session_config(dir.path())
    };
    let mut session = ExportSession::new(&graph, cfg);
    session.export_named("M_Base").unwrap();
    session.finish();
    assert!(dir.path().join("Material/M_Base.mat").is_file());
    assert!(!dir.path().join("Material/M_Base.props.txt").exists());
}

#[test]
fn parent_that_is_not_a_material_goes_to_its_own_exporter() {
    let dir = tempdir().unwrap();
    let graph = AssetGraph::from_json(
        r#"{"objects": [
            {"id": 1, "class": "Texture2D", "name": "Base_D"},
            {"id": 5, "class": "MaterialInstanceConstant", "name": "MI_Odd", "parent": 1}
        ]}"#,
    )
    .unwrap();
    let mut session = ExportSession::new(&graph, session_config(dir.path()));
    session.export_named("MI_Odd").unwrap();
    let report = session.finish();
    assert_eq!(report.materials_exported, 1);
    assert_eq!(report.objects_exported, 2);
    assert!(dir.path().join("Texture2D/Base_D.texture.json").is_file());
}

#[test]
fn material_naming_itself_is_exported_once() {
    let dir = tempdir().unwrap();
    let graph = AssetGraph::from_json(
        r#"{"objects": [
            {"id": 1, "class": "Texture2D", "name": "Wall_D"},
            {"id": 9, "class": "Material", "name": "M_Sky",
             "params": {"Diffuse": 1, "Cube": 9}, "textures": [1]}
        ]}"#,
    )
    .unwrap();
    let mut session = ExportSession::new(&graph, session_config(dir.path()));
    session.export_object(ObjectId(9));
    let report = session.finish();
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.materials_exported, 1);
    assert_eq!(report.objects_exported, 2);
    assert_eq!(
        report.files.iter().filter(|f| f.ends_with("M_Sky.mat")).count(),
        1
    );

    let mat = read_lines(&dir.path().join("Material/M_Sky.mat"));
    assert_eq!(mat, vec!["Diffuse=Wall_D", "Cube=M_Sky", "Diffuse=Wall_D"]);
}

#[test]
fn props_failure_keeps_sidecar_and_references() {
    let dir = tempdir().unwrap();
    // A directory where the props file should go makes it impossible to create.
    fs::create_dir_all(dir.path().join("Material/M_Base.props.txt")).unwrap();
    let graph = AssetGraph::from_json(CHAIN).unwrap();
    let mut session = ExportSession::new(&graph, session_config(dir.path()));
    session.export_named("M_Base").unwrap();
    let report = session.finish();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].object, ObjectId(10));
    assert_eq!(report.materials_exported, 1);
    let mat = read_lines(&dir.path().join("Material/M_Base.mat"));
    assert_eq!(mat, vec!["Diffuse=Base_D"]);
    assert!(dir.path().join("Texture2D/Base_D.texture.json").is_file());
}
