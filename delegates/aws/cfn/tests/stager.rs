mod common;

use std::io::Write;

use common::{CountingSleeper, MockCloud};
use deploy_delegate_cfn::{ArtifactStager, CfnError, DeployerConfig};
use tempfile::NamedTempFile;

const BUCKET: &str = "ask-hello-default-us-east-1-0123456789ab";

fn build_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file
}

#[tokio::test]
async fn first_upload_creates_and_versions_bucket() {
    let cloud = MockCloud::new();
    let sleeper = CountingSleeper::default();
    let config = DeployerConfig::default();
    let stager = ArtifactStager::new(&*cloud, &sleeper, "us-east-1", &config);
    let file = build_file(b"zip bytes");

    let version = stager
        .upload_to_s3(BUCKET, "endpoint/build.zip", file.path())
        .await
        .unwrap();

    assert_eq!(version.as_deref(), Some("v1"));
    assert_eq!(cloud.count("CreateBucket"), 1);
    assert_eq!(cloud.count("PutBucketVersioning"), 1);
    assert_eq!(cloud.count("PutObject"), 1);
    assert_eq!(sleeper.count(), 0);

    let state = cloud.state.lock().unwrap();
    assert_eq!(state.objects[0].0, BUCKET);
    assert_eq!(state.objects[0].1, "endpoint/build.zip");
    assert_eq!(state.objects[0].2, b"zip bytes".to_vec());
}

#[tokio::test]
async fn later_uploads_only_put_the_object() {
    let cloud = MockCloud::new();
    let sleeper = CountingSleeper::default();
    let config = DeployerConfig::default();
    let stager = ArtifactStager::new(&*cloud, &sleeper, "us-east-1", &config);
    let file = build_file(b"zip bytes");

    stager.upload_to_s3(BUCKET, "endpoint/build.zip", file.path()).await.unwrap();
    cloud.state.lock().unwrap().calls.clear();

    let version = stager
        .upload_to_s3(BUCKET, "endpoint/build.zip", file.path())
        .await
        .unwrap();

    assert_eq!(version.as_deref(), Some("v2"));
    assert_eq!(cloud.count("CreateBucket"), 0);
    assert_eq!(cloud.count("PutBucketVersioning"), 0);
    assert_eq!(cloud.count("PutObject"), 1);
}

#[tokio::test]
async fn existing_unversioned_bucket_gets_versioning() {
    let cloud = MockCloud::with_state(|s| {
        s.buckets.insert(BUCKET.to_string(), Some("Suspended".to_string()));
    });
    let sleeper = CountingSleeper::default();
    let config = DeployerConfig::default();
    let stager = ArtifactStager::new(&*cloud, &sleeper, "eu-west-1", &config);
    let file = build_file(b"zip");

    stager.upload_to_s3(BUCKET, "k", file.path()).await.unwrap();

    assert_eq!(cloud.count("CreateBucket"), 0);
    assert_eq!(cloud.count("PutBucketVersioning"), 1);
}

#[tokio::test]
async fn waits_for_new_bucket_to_become_visible() {
    let cloud = MockCloud::with_state(|s| s.bucket_propagation_checks = 2);
    let sleeper = CountingSleeper::default();
    let config = DeployerConfig::default();
    let stager = ArtifactStager::new(&*cloud, &sleeper, "us-east-1", &config);
    let file = build_file(b"zip");

    stager.upload_to_s3(BUCKET, "k", file.path()).await.unwrap();

    // initial check, two misses, then visible
    assert_eq!(cloud.count("HeadBucket"), 4);
    assert_eq!(sleeper.count(), 2);
    assert_eq!(cloud.count("PutObject"), 1);
}

#[tokio::test]
async fn gives_up_on_bucket_that_never_appears() {
    let cloud = MockCloud::with_state(|s| s.bucket_propagation_checks = 100);
    let sleeper = CountingSleeper::default();
    let config = DeployerConfig {
        bucket_wait_attempts: 3,
        ..Default::default()
    };
    let stager = ArtifactStager::new(&*cloud, &sleeper, "us-east-1", &config);
    let file = build_file(b"zip");

    let err = stager.upload_to_s3(BUCKET, "k", file.path()).await.unwrap_err();

    assert!(matches!(err, CfnError::BucketTimeout { attempts: 3, .. }));
    assert_eq!(sleeper.count(), 2);
    assert_eq!(cloud.count("PutObject"), 0);
}

#[tokio::test]
async fn upload_failure_is_passed_through() {
    let cloud = MockCloud::with_state(|s| s.fail_put = Some("Access Denied".to_string()));
    let sleeper = CountingSleeper::default();
    let config = DeployerConfig::default();
    let stager = ArtifactStager::new(&*cloud, &sleeper, "us-east-1", &config);
    let file = build_file(b"zip");

    let err = stager.upload_to_s3(BUCKET, "k", file.path()).await.unwrap_err();

    assert_eq!(err.to_string(), "Access Denied");
    assert_eq!(cloud.count("PutObject"), 1);
}

#[tokio::test]
async fn missing_build_file_fails_before_upload() {
    let cloud = MockCloud::new();
    let sleeper = CountingSleeper::default();
    let config = DeployerConfig::default();
    let stager = ArtifactStager::new(&*cloud, &sleeper, "us-east-1", &config);
    let dir = tempfile::tempdir().unwrap();

    let err = stager
        .upload_to_s3(BUCKET, "k", &dir.path().join("missing.zip"))
        .await
        .unwrap_err();

    assert!(matches!(err, CfnError::Io(_)));
    assert_eq!(cloud.count("PutObject"), 0);
}
