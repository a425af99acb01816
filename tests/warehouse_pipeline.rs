//! End-to-end tests for the DuckDB warehouse pipeline
//!
//! Local JSON fixtures → staging tables → star schema, plus agreement with
//! the lake pipeline on the same inputs

mod common;

use pretty_assertions::assert_eq;
use sparkify_etl::transform::CaseSensitivity;
use sparkify_etl::{
    Error, LakePipeline, PipelineConfig, Stage, TableCounts, TemplateContext, WarehousePipeline,
};

// ============================================================================
// Warehouse Runs
// ============================================================================

#[test]
fn test_full_run_from_config() {
    let dir = common::dataset();
    let config = common::config(&dir);

    let pipeline = WarehousePipeline::from_config(&config).unwrap();
    let counts = pipeline.run().unwrap();

    assert_eq!(
        counts,
        TableCounts {
            songs: 2,
            artists: 2,
            users: 3,
            time: 3,
            songplays: 3,
        }
    );
    assert_eq!(pipeline.plan().len(), 21);
    assert_eq!(pipeline.warehouse().database(), ":memory:");
}

#[test]
fn test_reset_only_leaves_tables_empty() {
    let dir = common::dataset();
    let config = common::config(&dir);

    let pipeline = WarehousePipeline::from_config(&config)
        .unwrap()
        .reset_only();
    let counts = pipeline.run().unwrap();

    assert_eq!(pipeline.plan().len(), 14);
    assert_eq!(counts, TableCounts::default());
}

#[test]
fn test_database_file_persists_between_runs() {
    let dir = common::dataset();
    let mut config = common::config(&dir);
    let database = dir.path().join("sparkify.duckdb");
    config.warehouse.as_mut().unwrap().database = database.display().to_string();

    let first = WarehousePipeline::from_config(&config).unwrap().run().unwrap();
    let second = WarehousePipeline::from_config(&config).unwrap().run().unwrap();

    assert!(database.exists());
    assert_eq!(first, second);
}

#[test]
fn test_missing_input_names_the_statement() {
    let dir = common::dataset();
    let mut config = common::config(&dir);
    config.warehouse.as_mut().unwrap().log_data =
        dir.path().join("nowhere/*.json").display().to_string();

    let err = WarehousePipeline::from_config(&config)
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(err, Error::Statement { .. }));
    assert!(err.to_string().contains("copy staging_events"));
}

#[test]
fn test_missing_warehouse_section() {
    let ctx = TemplateContext::new();
    let config =
        PipelineConfig::from_yaml("lake:\n  input: /data\n  output: /lake\n", &ctx).unwrap();

    let err = WarehousePipeline::from_config(&config).unwrap_err();
    assert!(err.to_string().contains("warehouse"));
}

// ============================================================================
// Pipeline Agreement
// ============================================================================

#[tokio::test]
async fn test_pipelines_agree_on_counts() {
    let dir = common::dataset();
    let config = common::config(&dir);

    let lake = LakePipeline::from_config(&config)
        .unwrap()
        .run(Stage::All)
        .await
        .unwrap();
    let warehouse = WarehousePipeline::from_config(&config)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(lake.counts, warehouse);
}

#[tokio::test]
async fn test_pipelines_agree_case_insensitive() {
    let dir = common::dataset();
    // Lowercased title only matches when case is ignored
    common::write(
        dir.path(),
        "log_data/2018-11-02-events.json",
        r#"{"artist":"ELENA","auth":"Logged In","firstName":"Kate","gender":"F","itemInSession":0,"lastName":"Harrell","length":269.58,"level":"paid","location":"Lansing, MI","method":"PUT","page":"NextSong","registration":1540472624796.0,"sessionId":293,"song":"setanta matins","status":200,"ts":1541203200000,"userId":"97"}"#,
    );

    let mut config = common::config(&dir);
    let sensitive = LakePipeline::from_config(&config)
        .unwrap()
        .run(Stage::All)
        .await
        .unwrap();
    assert_eq!(sensitive.counts.songplays, 3);

    config.matching.case = CaseSensitivity::Insensitive;
    let lake = LakePipeline::from_config(&config)
        .unwrap()
        .run(Stage::All)
        .await
        .unwrap();
    let warehouse = WarehousePipeline::from_config(&config)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(lake.counts.songplays, 4);
    assert_eq!(lake.counts, warehouse);
}

#[tokio::test]
async fn test_pipelines_agree_on_padded_keys() {
    let dir = common::dataset();
    // Tab and newline padding is stripped by both pipelines
    common::write(
        dir.path(),
        "log_data/2018-11-03-events.json",
        r#"{"artist":"Elena\t","auth":"Logged In","firstName":"Kate","gender":"F","itemInSession":1,"lastName":"Harrell","length":269.58,"level":"paid","location":"Lansing, MI","method":"PUT","page":"NextSong","registration":1540472624796.0,"sessionId":294,"song":"Setanta matins\n","status":200,"ts":1541289600000,"userId":"\t97 "}"#,
    );

    let config = common::config(&dir);
    let lake = LakePipeline::from_config(&config)
        .unwrap()
        .run(Stage::All)
        .await
        .unwrap();
    let warehouse = WarehousePipeline::from_config(&config)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(lake.counts.songplays, 4);
    assert_eq!(lake.counts, warehouse);
}

#[tokio::test]
async fn test_pipelines_agree_on_unicode_padding() {
    let dir = common::dataset();
    // A no-break space is part of the key on both sides, so nothing matches
    common::write(
        dir.path(),
        "log_data/2018-11-03-events.json",
        "{\"artist\":\"Elena\u{a0}\",\"auth\":\"Logged In\",\"firstName\":\"Kate\",\"gender\":\"F\",\"itemInSession\":1,\"lastName\":\"Harrell\",\"length\":269.58,\"level\":\"paid\",\"location\":\"Lansing, MI\",\"method\":\"PUT\",\"page\":\"NextSong\",\"registration\":1540472624796.0,\"sessionId\":294,\"song\":\"Setanta matins\",\"status\":200,\"ts\":1541289600000,\"userId\":\"97\"}",
    );

    let config = common::config(&dir);
    let lake = LakePipeline::from_config(&config)
        .unwrap()
        .run(Stage::All)
        .await
        .unwrap();
    let warehouse = WarehousePipeline::from_config(&config)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(lake.counts.songplays, 3);
    assert_eq!(lake.counts, warehouse);
}
