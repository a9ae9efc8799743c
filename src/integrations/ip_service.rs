use crate::error::Error;
use crate::watcher::IpSource;
use async_trait::async_trait;

/// Plain-text "what is my IP" endpoint.
#[derive(Debug, Clone)]
pub struct IpService {
    http: reqwest::Client,
    url: String,
}

impl IpService {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub async fn fetch(&self) -> Result<String, Error> {
        fetch_ip(&self.http, &self.url).await
    }
}

#[async_trait]
impl IpSource for IpService {
    async fn current_ip(&self) -> Result<String, Error> {
        self.fetch().await
    }
}

/// GET `url` and return its body with surrounding whitespace removed.
pub async fn fetch_ip(http: &reqwest::Client, url: &str) -> Result<String, Error> {
    let resp = http.get(url).send().await.map_err(Error::from_transport)?;

    if !resp.status().is_success() {
        let status = resp.status();
        return Err(Error::UnexpectedResponse(format!(
            "IP service returned {status}"
        )));
    }

    let body = resp.text().await.map_err(Error::from_transport)?;
    let ip = body.trim();
    if ip.is_empty() {
        return Err(Error::UnexpectedResponse("IP service returned an empty body".into()));
    }

    Ok(ip.to_string())
}
