//! Environment and file based configuration loading.

mod support;

use std::str::FromStr;

use store_uptime::config::ReportConfig;
use store_uptime::db::factory::{RepositoryFactory, RepositoryType};
use store_uptime::db::{ObservationRepository, RepositoryConfig};

#[test]
fn test_report_config_defaults_without_env() {
    support::with_scoped_env(
        &[
            ("REPORT_BATCH_SIZE", None),
            ("REPORT_FALLBACK_TIMEZONE", None),
        ],
        || {
            assert_eq!(ReportConfig::from_env().unwrap(), ReportConfig::default());
        },
    );
}

#[test]
fn test_report_config_reads_env() {
    support::with_scoped_env(
        &[
            ("REPORT_BATCH_SIZE", Some("25")),
            ("REPORT_FALLBACK_TIMEZONE", Some("Europe/Berlin")),
        ],
        || {
            let config = ReportConfig::from_env().unwrap();
            assert_eq!(config.batch_size, 25);
            assert_eq!(config.fallback_timezone, chrono_tz::Europe::Berlin);
        },
    );
}

#[test]
fn test_report_config_rejects_bad_env() {
    support::with_scoped_env(
        &[
            ("REPORT_BATCH_SIZE", Some("0")),
            ("REPORT_FALLBACK_TIMEZONE", None),
        ],
        || assert!(ReportConfig::from_env().is_err()),
    );
    support::with_scoped_env(
        &[
            ("REPORT_BATCH_SIZE", Some("lots")),
            ("REPORT_FALLBACK_TIMEZONE", None),
        ],
        || assert!(ReportConfig::from_env().is_err()),
    );
    support::with_scoped_env(
        &[
            ("REPORT_BATCH_SIZE", None),
            ("REPORT_FALLBACK_TIMEZONE", Some("Atlantis/Capital")),
        ],
        || assert!(ReportConfig::from_env().is_err()),
    );
}

#[test]
fn test_repository_type_from_str() {
    assert_eq!(
        RepositoryType::from_str("POSTGRES").unwrap(),
        RepositoryType::Postgres
    );
    assert_eq!(
        RepositoryType::from_str("LOCAL").unwrap(),
        RepositoryType::Local
    );
    let err = RepositoryType::from_str("invalid").unwrap_err();
    assert!(err.contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/stores")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres),
    );
}

#[test]
fn test_repository_type_env_override() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/stores")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[tokio::test]
async fn test_factory_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repository.toml");
    std::fs::write(
        &path,
        r#"
[repository]
type = "local"

[report]
batch_size = 100
fallback_timezone = "America/Denver"
"#,
    )
    .unwrap();

    let repo = RepositoryFactory::from_config_file(&path).await.unwrap();
    assert!(repo.health_check().await.unwrap());

    let report = RepositoryConfig::from_file(&path)
        .unwrap()
        .to_report_config()
        .unwrap();
    assert_eq!(report.batch_size, 100);
    assert_eq!(report.fallback_timezone, chrono_tz::America::Denver);
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_postgres_without_feature_is_configuration_error() {
    let result = RepositoryFactory::create(RepositoryType::Postgres, None).await;
    assert!(result.is_err());
}
