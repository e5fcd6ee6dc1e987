//! Tests for the archive installation pipeline.

use super::*;
use crate::artefact::download::MockRetriever;
use crate::artefact::extraction::MockArtefactExtractor;
use crate::error::InstallerError;
use crate::filetree::FileTreeError;
use crate::test_utils::SAMPLE_FILETREE_JSON;
use rstest::{fixture, rstest};
use std::path::Path;
use tempfile::TempDir;

const UBUNTU20_URL: &str = concat!(
    "https://storage.openvinotoolkit.org/repositories/openvino/packages/2022.3/linux/",
    "l_openvino_toolkit_ubuntu20_2022.3.0.9052.9752fafe8eb_x86_64.tgz"
);
const UBUNTU20_STEM: &str = "l_openvino_toolkit_ubuntu20_2022.3.0.9052.9752fafe8eb_x86_64";

/// A download directory already holding the sample manifest.
#[fixture]
fn workspace() -> TempDir {
    let temp = tempfile::tempdir().expect("temp dir");
    std::fs::write(temp.path().join("filetree.json"), SAMPLE_FILETREE_JSON).expect("manifest");
    temp
}

fn settings_for(dir: &Path) -> Settings {
    Settings {
        storage_url: "https://storage.openvinotoolkit.org".to_owned(),
        download_dir: dir.to_path_buf(),
        cache_dir: None,
    }
}

fn ubuntu_target(release: &str) -> Target {
    Target {
        version: "2022.3.0".to_owned(),
        os: "linux".to_owned(),
        arch: "x86_64".to_owned(),
        release: Some(release.to_owned()),
        linux_release: None,
    }
}

#[rstest]
fn resolves_url_from_cached_manifest(workspace: TempDir) {
    let settings = settings_for(workspace.path());
    let mut retriever = MockRetriever::new();
    retriever.expect_fetch_or_cache_hit().never();

    let url = resolve_download_url(&settings, &retriever, &ubuntu_target("ubuntu20"))
        .expect("url");
    assert_eq!(url, UBUNTU20_URL);
}

#[rstest]
fn custom_storage_prefixes_urls(workspace: TempDir) {
    let mut settings = settings_for(workspace.path());
    settings.storage_url = "https://mirror.example.test/ov".to_owned();
    let retriever = MockRetriever::new();

    let url = resolve_download_url(&settings, &retriever, &ubuntu_target("ubuntu20"))
        .expect("url");
    assert!(url.starts_with("https://mirror.example.test/ov/repositories/openvino/packages/"));
}

#[test]
fn missing_manifest_is_fetched_from_configured_storage() {
    let temp = tempfile::tempdir().expect("temp dir");
    let mut settings = settings_for(&temp.path().join("nested"));
    settings.storage_url = "https://mirror.example.test".to_owned();

    let mut retriever = MockRetriever::new();
    retriever
        .expect_fetch_or_cache_hit()
        .withf(|url, _| url == "https://mirror.example.test/filetree.json")
        .times(1)
        .returning(|_, path| {
            std::fs::write(path, SAMPLE_FILETREE_JSON)?;
            Ok(path.to_path_buf())
        });

    let tree = load_manifest(&settings, &retriever).expect("manifest");
    assert_eq!(tree.name, "production");
}

#[rstest]
fn unmatched_release_surfaces_no_match(workspace: TempDir) {
    let settings = settings_for(workspace.path());
    let retriever = MockRetriever::new();

    let err = resolve_download_url(&settings, &retriever, &ubuntu_target("ubuntu22"))
        .expect_err("no ubuntu22 package");
    assert!(matches!(
        err,
        InstallerError::FileTree(FileTreeError::NoMatch { .. })
    ));
}

#[rstest]
fn installs_archive_into_download_dir(workspace: TempDir) {
    let settings = settings_for(workspace.path());
    let expected_archive = workspace.path().join(format!("{UBUNTU20_STEM}.tgz"));

    let mut retriever = MockRetriever::new();
    let archive_for_download = expected_archive.clone();
    retriever
        .expect_fetch_or_cache_hit()
        .withf(move |url, path| url == UBUNTU20_URL && path == archive_for_download.as_path())
        .times(1)
        .returning(|_, path| Ok(path.to_path_buf()));

    let mut extractor = MockArtefactExtractor::new();
    let download_dir = workspace.path().to_path_buf();
    extractor
        .expect_extract()
        .withf(move |_, dest| dest == download_dir.as_path())
        .times(1)
        .returning(|_, dest| {
            std::fs::create_dir_all(dest.join(UBUNTU20_STEM))?;
            Ok(vec![
                format!("{UBUNTU20_STEM}/"),
                format!("{UBUNTU20_STEM}/setupvars.sh"),
            ])
        });

    let context = PipelineContext {
        settings: &settings,
        retriever: &retriever,
        extractor: &extractor,
        quiet: false,
    };
    let mut stderr = Vec::new();
    let installed =
        install_archive(&context, &ubuntu_target("ubuntu20"), &mut stderr).expect("install");

    assert_eq!(installed.url, UBUNTU20_URL);
    assert_eq!(installed.archive, expected_archive);
    assert_eq!(installed.install_dir, workspace.path().join(UBUNTU20_STEM));
    assert_eq!(installed.entries, 2);

    let progress = String::from_utf8(stderr).expect("stderr UTF-8");
    assert!(progress.contains("Downloading"));
    assert!(progress.contains("Extracting"));
}

#[rstest]
fn quiet_mode_suppresses_progress(workspace: TempDir) {
    let settings = settings_for(workspace.path());
    let mut retriever = MockRetriever::new();
    retriever
        .expect_fetch_or_cache_hit()
        .returning(|_, path| Ok(path.to_path_buf()));
    let mut extractor = MockArtefactExtractor::new();
    extractor
        .expect_extract()
        .returning(|_, _| Ok(vec!["entry".to_owned()]));

    let context = PipelineContext {
        settings: &settings,
        retriever: &retriever,
        extractor: &extractor,
        quiet: true,
    };
    let mut stderr = Vec::new();
    install_archive(&context, &ubuntu_target("ubuntu20"), &mut stderr).expect("install");
    assert!(stderr.is_empty());
}

#[rstest]
fn download_failure_skips_extraction(workspace: TempDir) {
    let settings = settings_for(workspace.path());
    let mut retriever = MockRetriever::new();
    retriever.expect_fetch_or_cache_hit().returning(|url, _| {
        Err(DownloadError::NotFound {
            url: url.to_owned(),
        })
    });
    let mut extractor = MockArtefactExtractor::new();
    extractor.expect_extract().never();

    let context = PipelineContext {
        settings: &settings,
        retriever: &retriever,
        extractor: &extractor,
        quiet: true,
    };
    let err = install_archive(&context, &ubuntu_target("ubuntu20"), &mut Vec::new())
        .expect_err("download fails");
    assert!(matches!(
        err,
        InstallerError::Download(DownloadError::NotFound { .. })
    ));
}

#[rstest]
fn extraction_failure_propagates(workspace: TempDir) {
    let settings = settings_for(workspace.path());
    let mut retriever = MockRetriever::new();
    retriever
        .expect_fetch_or_cache_hit()
        .returning(|_, path| Ok(path.to_path_buf()));
    let mut extractor = MockArtefactExtractor::new();
    extractor
        .expect_extract()
        .returning(|_, _| Err(ExtractionError::EmptyArchive));

    let context = PipelineContext {
        settings: &settings,
        retriever: &retriever,
        extractor: &extractor,
        quiet: true,
    };
    let err = install_archive(&context, &ubuntu_target("ubuntu20"), &mut Vec::new())
        .expect_err("empty archive");
    assert!(matches!(
        err,
        InstallerError::Extraction(ExtractionError::EmptyArchive)
    ));
}
