use anyhow::Result;
use dispatchgen_ir::{EmitterRegistry, LinalgEmitter, MlirDialect};
use dispatchgen_library::{
    ConfigurationCatalog, DataType, DispatchError, MatmulConfiguration, OperationKind,
    TensorDescription,
};
use dispatchgen_manifest::{EmitReport, Manifest, ManifestConfig};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "dispatchgen-{}-{}",
        test,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn mlir_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "mlir") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

fn read_all(files: &[PathBuf]) -> Result<BTreeMap<PathBuf, String>> {
    files
        .iter()
        .map(|path| -> Result<(PathBuf, String)> { Ok((path.clone(), fs::read_to_string(path)?)) })
        .collect()
}

fn two_matmuls() -> Result<ConfigurationCatalog> {
    Ok(ConfigurationCatalog::builder()
        .add_matmul(MatmulConfiguration::new(128, 128, 32, DataType::F32))
        .add_matmul(MatmulConfiguration::new(256, 256, 32, DataType::F32))
        .build()?)
}

#[test]
fn descriptor_names_are_unique_across_predefined_catalog() -> Result<()> {
    let catalog = ConfigurationCatalog::predefined();
    let mut manifest = Manifest::new(ManifestConfig::default());
    manifest.load(&catalog)?;
    let names: HashSet<&str> = manifest.dispatches().iter().map(|d| d.name()).collect();
    assert_eq!(names.len(), catalog.len());
    Ok(())
}

#[test]
fn unfiltered_emit_writes_one_file_per_catalog_entry() -> Result<()> {
    let build_dir = scratch_dir("unfiltered");
    let catalog = ConfigurationCatalog::predefined();
    let mut manifest = Manifest::new(ManifestConfig::new(&build_dir));
    manifest.load(&catalog)?;
    manifest.filter("all", "")?;
    let report = manifest.emit(MlirDialect::Linalg)?;

    assert_eq!(report.len(), catalog.len());
    assert_eq!(mlir_files(&build_dir).len(), catalog.len());

    let index = EmitReport::load(&manifest.config().index_path())?;
    assert_eq!(index, report);
    assert_eq!(index.device, "cuda");

    fs::remove_dir_all(&build_dir)?;
    Ok(())
}

#[test]
fn kind_filter_emits_only_that_kind() -> Result<()> {
    let build_dir = scratch_dir("kind-filter");
    let catalog = ConfigurationCatalog::predefined();
    let mut manifest = Manifest::new(ManifestConfig::new(&build_dir));
    manifest.load(&catalog)?;
    manifest.filter("matmul", "")?;
    let report = manifest.emit(MlirDialect::Linalg)?;

    assert_eq!(report.len(), catalog.len_of(OperationKind::Matmul));
    assert!(report.len() < catalog.len());
    assert!(report
        .dispatches
        .iter()
        .all(|file| file.kind == OperationKind::Matmul));
    assert!(!build_dir.join("generated/linalg/conv2d").exists());

    fs::remove_dir_all(&build_dir)?;
    Ok(())
}

#[test]
fn unmatched_name_filter_emits_nothing() -> Result<()> {
    let build_dir = scratch_dir("no-match");
    let mut manifest = Manifest::new(ManifestConfig::new(&build_dir));
    manifest.load(&ConfigurationCatalog::predefined())?;
    manifest.filter("all", "matmul_1x1x1,conv2d_does_not_exist")?;
    let report = manifest.emit(MlirDialect::Linalg)?;

    assert!(report.is_empty());
    assert!(!build_dir.exists());
    Ok(())
}

#[test]
fn repeated_emission_is_byte_identical() -> Result<()> {
    let build_dir = scratch_dir("deterministic");
    let mut manifest = Manifest::new(ManifestConfig::new(&build_dir));
    manifest.load(&ConfigurationCatalog::predefined())?;
    manifest.filter("all", "")?;

    manifest.emit_all(&MlirDialect::ALL)?;
    let first = read_all(&mlir_files(&build_dir))?;
    let first_index = fs::read(manifest.config().index_path())?;

    manifest.emit_all(&MlirDialect::ALL)?;
    let second = read_all(&mlir_files(&build_dir))?;
    let second_index = fs::read(manifest.config().index_path())?;

    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(first_index, second_index);

    fs::remove_dir_all(&build_dir)?;
    Ok(())
}

#[test]
fn unregistered_dialect_fails_without_writing() -> Result<()> {
    let build_dir = scratch_dir("unregistered");
    let mut registry = EmitterRegistry::new();
    registry.register(LinalgEmitter::new());
    let mut manifest = Manifest::with_registry(ManifestConfig::new(&build_dir), registry);
    manifest.load(&ConfigurationCatalog::predefined())?;

    let err = manifest
        .emit_all(&[MlirDialect::Linalg, MlirDialect::Flow])
        .unwrap_err();
    assert!(matches!(err, DispatchError::UnsupportedDialect(ref name) if name == "flow"));
    assert!(!build_dir.exists());
    Ok(())
}

#[test]
fn unrenderable_dispatch_aborts_whole_batch() -> Result<()> {
    let build_dir = scratch_dir("unrenderable");
    let catalog = ConfigurationCatalog::builder()
        .add_matmul(MatmulConfiguration::new(64, 64, 64, DataType::F32))
        .add_matmul(
            MatmulConfiguration::new(64, 64, 64, DataType::F32).with_operands(
                TensorDescription::column_major(DataType::F32),
                TensorDescription::column_major(DataType::F32),
                TensorDescription::row_major(DataType::F32),
            ),
        )
        .build()?;
    let mut manifest = Manifest::new(ManifestConfig::new(&build_dir));
    manifest.load(&catalog)?;

    let err = manifest.emit(MlirDialect::Linalg).unwrap_err();
    assert!(matches!(err, DispatchError::UnsupportedOperation { .. }));
    assert!(!build_dir.exists());
    Ok(())
}

#[test]
fn single_named_matmul_dispatch() -> Result<()> {
    let build_dir = scratch_dir("single-named");
    let mut manifest = Manifest::new(ManifestConfig::new(&build_dir));
    manifest.load(&two_matmuls()?)?;
    manifest.filter("matmul", "matmul_128x128x32")?;
    let report = manifest.emit(MlirDialect::Linalg)?;

    let files = mlir_files(&build_dir);
    assert_eq!(files.len(), 1);
    assert_eq!(
        files[0],
        build_dir.join("generated/linalg/matmul/matmul_128x128x32.mlir")
    );
    assert_eq!(report.dispatches[0].path, "generated/linalg/matmul/matmul_128x128x32.mlir");

    let text = fs::read_to_string(&files[0])?;
    assert!(text.contains("func.func @matmul_128x128x32(%lhs: tensor<128x32xf32>, %rhs: tensor<32x128xf32>) -> tensor<128x128xf32>"));
    assert!(text.contains("linalg.matmul ins(%lhs, %rhs"));
    assert!(!build_dir
        .join("generated/linalg/matmul/matmul_256x256x32.mlir")
        .exists());

    fs::remove_dir_all(&build_dir)?;
    Ok(())
}

#[test]
fn all_dialects_write_separate_trees() -> Result<()> {
    let build_dir = scratch_dir("all-dialects");
    let mut manifest = Manifest::new(ManifestConfig::new(&build_dir));
    manifest.load(&two_matmuls()?)?;
    let report = manifest.emit_all(&MlirDialect::ALL)?;

    assert_eq!(report.count_for(MlirDialect::Linalg), 2);
    assert_eq!(report.count_for(MlirDialect::Flow), 2);
    let flow = fs::read_to_string(build_dir.join("generated/flow/matmul/matmul_256x256x32.mlir"))?;
    assert!(flow.contains("flow.dispatch.region"));

    fs::remove_dir_all(&build_dir)?;
    Ok(())
}
