use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use subtran::config::Config;
use subtran::device::Device;
use subtran::error::Result;
use subtran::translate::{BackendFactory, DecodingOptions, HttpBackendFactory, TranslationBackend};
use subtran::workflow::{output_path_for, TranslationDriver};

struct UppercaseBackend;

#[async_trait]
impl TranslationBackend for UppercaseBackend {
    async fn translate(&self, text: &str, _options: &DecodingOptions) -> Result<String> {
        Ok(text.to_uppercase())
    }

    fn name(&self) -> &str {
        "uppercase"
    }
}

struct CountingFactory {
    created: Arc<AtomicUsize>,
}

#[async_trait]
impl BackendFactory for CountingFactory {
    async fn create(&self) -> Result<Box<dyn TranslationBackend>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(UppercaseBackend))
    }
}

fn driver_with(batch_size: usize) -> (TranslationDriver, Arc<AtomicUsize>) {
    let created = Arc::new(AtomicUsize::new(0));
    let mut config = Config::default();
    config.output.batch_size = batch_size;
    let factory = CountingFactory { created: created.clone() };
    let driver = TranslationDriver::new(config, Box::new(factory))
        .unwrap()
        .without_progress();
    (driver, created)
}

#[tokio::test]
async fn translates_file_next_to_input() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("episode01.srt");
    std::fs::write(
        &input,
        "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\n",
    )
    .unwrap();

    let output = output_path_for(&input, None, "_translated").unwrap();
    assert_eq!(output, dir.path().join("episode01_translated.srt"));

    let (driver, created) = driver_with(8);
    driver.translate_file(&input, &output).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "1\n00:00:01,000 --> 00:00:02,000\nHELLO\n\n2\n00:00:03,000 --> 00:00:04,000\nWORLD"
    );
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn drops_malformed_blocks_and_keeps_order() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("show.srt");
    std::fs::write(
        &input,
        "1\n00:00:01,000 --> 00:00:02,000\nfirst\n\n3\nbadline\n\n\n\n4\n00:00:05,000 --> 00:00:06,000\nsecond\nline two\n",
    )
    .unwrap();
    let out_dir = dir.path().join("out");
    let output = output_path_for(&input, Some(&out_dir), "_translated").unwrap();

    let (driver, _) = driver_with(1);
    let outcome = driver.translate_file(&input, &output).await.unwrap();

    assert_eq!(outcome.dropped, 1);
    assert_eq!(
        std::fs::read_to_string(out_dir.join("show_translated.srt")).unwrap(),
        "1\n00:00:01,000 --> 00:00:02,000\nFIRST\n\n4\n00:00:05,000 --> 00:00:06,000\nSECOND\nLINE TWO"
    );
}

#[tokio::test]
async fn empty_file_gives_empty_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("empty.srt");
    std::fs::write(&input, "").unwrap();
    let output = dir.path().join("empty_translated.srt");

    let (driver, created) = driver_with(8);
    driver.translate_file(&input, &output).await.unwrap();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
    assert_eq!(created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn translates_through_model_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/Helsinki-NLP/opus-mt-fr-en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "loaded": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/Helsinki-NLP/opus-mt-fr-en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "translation_text": "Good evening" }])))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.translate.endpoint = Some(server.uri());
    config.translate.model = "Helsinki-NLP/opus-mt-fr-en".to_string();
    config.translate.device = Device::Cpu;

    let dir = tempdir().unwrap();
    let input = dir.path().join("film.srt");
    std::fs::write(
        &input,
        "1\n00:00:01,000 --> 00:00:02,000\nBonsoir\n\n2\n00:00:03,000 --> 00:00:04,000\nBonsoir",
    )
    .unwrap();
    let output = dir.path().join("film_translated.srt");

    let factory = HttpBackendFactory::new(config.translate.clone());
    let driver = TranslationDriver::new(config, Box::new(factory)).unwrap().without_progress();
    driver.translate_file(&input, &output).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "1\n00:00:01,000 --> 00:00:02,000\nGood evening\n\n2\n00:00:03,000 --> 00:00:04,000\nGood evening"
    );
}
