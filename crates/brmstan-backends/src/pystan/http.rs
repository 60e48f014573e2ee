//! httpstan REST interface.

use std::thread;
use std::time::Duration;

use brmstan_core::StanData;
use reqwest::blocking::{Client, Response};
use serde_json::{json, Map, Value};

use super::wrong_model;
use crate::args::SampleArgs;
use crate::dispatch::SamplingBackend;
use crate::error::{BackendError, Result};
use crate::kind::BackendKind;
use crate::model::BuiltModel;
use crate::posterior::Posterior;

const SAMPLER: &str = "stan::services::sample::hmc_nuts_diag_e_adapt";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Client for an httpstan server.
#[derive(Debug, Clone)]
pub struct HttpStan {
    base: String,
    client: Client,
}

impl HttpStan {
    pub fn new(url: &str) -> Result<Self> {
        // Compilation and sampling run for minutes; only the health check
        // has a timeout.
        let client = Client::builder().timeout(None).build()?;
        Ok(Self {
            base: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.base
    }

    /// `GET /v1/health`.
    pub fn health(&self) -> Result<()> {
        self.client
            .get(self.endpoint("health"))
            .timeout(HEALTH_TIMEOUT)
            .send()?
            .error_for_status()?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base, path)
    }

    /// Start one chain and return the finished operation.
    fn run_chain(&self, model: &HttpStanModel, args: &SampleArgs, chain: usize) -> Result<Value> {
        let body = fit_request(model.data(), args, chain)?;
        let response = self
            .client
            .post(self.endpoint(&format!("{}/fits", model.name())))
            .json(&body)
            .send()?;
        let mut operation: Value = checked(response, BackendError::sample)?.json()?;

        while !operation["done"].as_bool().unwrap_or(false) {
            thread::sleep(POLL_INTERVAL);
            let name = str_field(&operation, "name")?;
            let response = self.client.get(self.endpoint(name)).send()?;
            operation = checked(response, BackendError::sample)?.json()?;
        }

        if let Some(code) = operation["result"].get("code") {
            let message = operation["result"]["message"]
                .as_str()
                .unwrap_or("no message");
            return Err(BackendError::sample(format!(
                "chain {chain} failed ({code}): {message}"
            )));
        }
        Ok(operation)
    }
}

impl SamplingBackend for HttpStan {
    fn kind(&self) -> BackendKind {
        BackendKind::PyStan
    }

    fn describe(&self) -> String {
        format!("httpstan at {}", self.base)
    }

    fn build(&self, program: &str, data: &StanData) -> Result<BuiltModel> {
        let response = self
            .client
            .post(self.endpoint("models"))
            .json(&json!({ "program_code": program }))
            .send()?;
        let body: Value = checked(response, BackendError::build)?.json()?;
        let name = str_field(&body, "name")?;
        log::debug!("httpstan built {name}");
        Ok(BuiltModel::HttpStan(HttpStanModel::new(
            &self.base,
            name,
            data.clone(),
        )))
    }

    /// Samples with the data bound at build time; `data` is not consulted.
    fn sample(&self, model: &BuiltModel, _data: &StanData, args: &SampleArgs) -> Result<Posterior> {
        let BuiltModel::HttpStan(model) = model else {
            return Err(wrong_model(model, "httpstan"));
        };
        if model.url() != self.base {
            return Err(BackendError::sample(format!(
                "{} was built by the server at {}, not {}",
                model.name(),
                model.url(),
                self.base
            )));
        }

        let mut posterior = Posterior::default();
        for chain in 1..=args.chains()? {
            let operation = self.run_chain(model, args, chain)?;
            let fit = operation["metadata"]["fit"]["name"]
                .as_str()
                .or_else(|| operation["result"]["name"].as_str())
                .ok_or_else(|| BackendError::Output {
                    detail: "operation does not name its fit".to_string(),
                })?;
            let response = self.client.get(self.endpoint(fit)).send()?;
            let text = checked(response, BackendError::sample)?.text()?;
            posterior.extend(parse_fit(&text)?)?;
        }
        Ok(posterior)
    }
}

/// A model registered with an httpstan server, with the data bound to it.
#[derive(Debug, Clone)]
pub struct HttpStanModel {
    base: String,
    name: String,
    data: StanData,
}

impl HttpStanModel {
    pub fn new(base: &str, name: &str, data: StanData) -> Self {
        Self {
            base: base.to_string(),
            name: name.to_string(),
            data,
        }
    }

    /// Server-assigned name, `models/<id>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Server the model was built on.
    pub fn url(&self) -> &str {
        &self.base
    }

    pub fn data(&self) -> &StanData {
        &self.data
    }
}

/// Request body for `POST /v1/{model}/fits`.
fn fit_request(data: &StanData, args: &SampleArgs, chain: usize) -> Result<Value> {
    let mut body = Map::new();
    body.insert("function".into(), SAMPLER.into());
    body.insert("data".into(), serde_json::to_value(data)?);
    body.insert("chain".into(), chain.into());
    if let Some(n) = args.num_samples()? {
        body.insert("num_samples".into(), n.into());
    }
    if let Some(n) = args.num_warmup()? {
        body.insert("num_warmup".into(), n.into());
    }
    if let Some(seed) = args.seed()? {
        body.insert("random_seed".into(), seed.into());
    }
    for (key, value) in args.extra() {
        let key = match key {
            "adapt_delta" => "delta",
            "max_treedepth" => "max_depth",
            other => other,
        };
        body.insert(key.to_string(), value.clone());
    }
    Ok(Value::Object(body))
}

/// Parse the newline-delimited JSON messages of one fit into a
/// single-chain posterior.
///
/// Only `sample` messages count. A list of values is the column header; an
/// object of values is one draw.
pub fn parse_fit(text: &str) -> Result<Posterior> {
    let mut columns: Vec<String> = Vec::new();
    let mut draws = Vec::new();

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let message: Value = serde_json::from_str(line)?;
        let is_sample = message["topic"]
            .as_str()
            .is_some_and(|t| t.eq_ignore_ascii_case("sample"));
        if !is_sample {
            continue;
        }
        match &message["values"] {
            Value::Array(names) => {
                columns = names
                    .iter()
                    .map(|n| n.as_str().unwrap_or_default().to_string())
                    .collect();
            }
            Value::Object(values) => {
                if columns.is_empty() {
                    columns = values.keys().cloned().collect();
                }
                let row = columns
                    .iter()
                    .map(|c| values.get(c).and_then(Value::as_f64).unwrap_or(f64::NAN))
                    .collect();
                draws.push(row);
            }
            _ => {}
        }
    }

    let mut posterior = Posterior::new(columns);
    posterior.push_chain(draws)?;
    Ok(posterior)
}

/// Pass `response` through when successful; otherwise read httpstan's
/// error message into the error built by `fail`.
fn checked(response: Response, fail: fn(String) -> BackendError) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or(text);
    Err(fail(format!("{status}: {message}")))
}

fn str_field<'a>(value: &'a Value, field: &str) -> Result<&'a str> {
    value[field].as_str().ok_or_else(|| BackendError::Output {
        detail: format!("httpstan response has no '{field}'"),
    })
}

impl BackendError {
    fn build(detail: String) -> Self {
        BackendError::Build {
            backend: BackendKind::PyStan,
            detail,
        }
    }

    fn sample(detail: String) -> Self {
        BackendError::Sample {
            backend: BackendKind::PyStan,
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brmstan_core::StanValue;

    const FIT: &str = r#"{"version": 1, "topic": "logger", "values": ["info:Gradient evaluation took 1e-05 seconds"]}
{"version": 1, "topic": "initialization", "values": ["info:Iteration: 1 / 2000"]}
{"version": 1, "topic": "sample", "values": ["lp__", "accept_stat__", "mu"]}
{"version": 1, "topic": "sample", "values": {"lp__": -1.5, "accept_stat__": 0.9, "mu": 0.25}}

{"version": 1, "topic": "SAMPLE", "values": {"lp__": -1.0, "accept_stat__": 1.0, "mu": 0.75}}
{"version": 1, "topic": "diagnostic", "values": {"lp__": 0, "mu": 99}}
"#;

    #[test]
    fn parses_sample_messages() {
        let posterior = parse_fit(FIT).unwrap();
        assert_eq!(posterior.columns(), &["lp__", "accept_stat__", "mu"]);
        assert_eq!(posterior.num_draws(), 2);
        assert_eq!(posterior.mean("mu"), Some(0.5));
    }

    #[test]
    fn header_comes_from_first_draw_when_missing() {
        let text = r#"{"topic": "sample", "values": {"b": 2.0, "a": 1.0}}"#;
        let posterior = parse_fit(text).unwrap();
        assert_eq!(posterior.columns().len(), 2);
        assert_eq!(posterior.column("a"), Some(vec![1.0]));
    }

    #[test]
    fn malformed_message_is_an_error() {
        assert!(matches!(parse_fit("{not json"), Err(BackendError::Json(_))));
    }

    #[test]
    fn fit_request_maps_arguments() {
        let mut data = StanData::new();
        data.insert("N".into(), StanValue::Int(3));
        let args = SampleArgs::new()
            .with("num_samples", 100)
            .with("seed", 11)
            .with("adapt_delta", 0.9);

        let body = fit_request(&data, &args, 2).unwrap();
        assert_eq!(
            body,
            json!({
                "function": SAMPLER,
                "data": {"N": 3},
                "chain": 2,
                "num_samples": 100,
                "random_seed": 11,
                "delta": 0.9,
            })
        );
    }

    #[test]
    fn model_from_another_server_is_refused() {
        let http = HttpStan::new("http://127.0.0.1:9").unwrap();
        let model = BuiltModel::HttpStan(HttpStanModel::new(
            "http://stan.internal:8080",
            "models/abc",
            StanData::new(),
        ));
        let err = http
            .sample(&model, &StanData::new(), &SampleArgs::new())
            .unwrap_err();
        match err {
            BackendError::Sample { detail, .. } => {
                assert!(detail.contains("http://stan.internal:8080"), "{detail}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let http = HttpStan::new("http://localhost:8080/").unwrap();
        assert_eq!(http.url(), "http://localhost:8080");
        assert_eq!(http.endpoint("health"), "http://localhost:8080/v1/health");
    }
}
