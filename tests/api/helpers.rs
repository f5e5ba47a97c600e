use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response};

use secrecy::Secret;

use serde::Serialize;

use sqlx::SqlitePool;

use url::Url;

use wiremock::MockServer;

use weather_subscriptions::app;
use weather_subscriptions::client::{EmailClient, EmailNotifier, WeatherClient};
use weather_subscriptions::db;
use weather_subscriptions::domain::Frequency;
use weather_subscriptions::model::Subscription;
use weather_subscriptions::repo::SqliteSubscriptionRepo;
use weather_subscriptions::service::SubscriptionService;

pub const FRONTEND_BASE_URL: &str = "http://127.0.0.1:3000";
pub const WEATHER_API_KEY: &str = "test-weather-key";

#[derive(Debug, Default, Serialize)]
pub struct NewSubscriber {
    pub email: Option<String>,
    pub city: Option<String>,
    pub frequency: Option<String>,
}

impl NewSubscriber {
    pub fn new(email: &str, city: &str, frequency: &str) -> Self {
        Self {
            email: Some(email.into()),
            city: Some(city.into()),
            frequency: Some(frequency.into()),
        }
    }
}

pub struct TestApp {
    addr: String,

    pub pool: SqlitePool,
    pub client: Client,
    pub email_server: MockServer,
    pub weather_server: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to listen on random port");
        let port = listener.local_addr().unwrap().port();

        let addr = format!("http://127.0.0.1:{}", port);

        let pool = db::memory_pool()
            .await
            .expect("Failed to create test database");

        let email_server = MockServer::start().await;
        let weather_server = MockServer::start().await;

        let email_client = {
            let sender = "test@test.com"
                .parse()
                .expect("Failed to parse sender email address");
            let api_base_url =
                Url::parse(&email_server.uri()).expect("Failed to parse mock server uri");
            let api_auth_token = Secret::new("TestAuthorization".into());
            let api_timeout = Duration::from_secs(2);

            EmailClient::new(sender, api_timeout, api_base_url, api_auth_token)
                .expect("Failed to create email client")
        };

        let subscription_service = SubscriptionService::new(
            Arc::new(SqliteSubscriptionRepo::new(pool.clone())),
            Arc::new(EmailNotifier::new(email_client)),
            Url::parse(FRONTEND_BASE_URL).unwrap(),
            vec![Frequency::Hourly, Frequency::Daily, Frequency::Weekly],
        );

        let weather_client = {
            let api_base_url = Url::parse(&format!("{}/v1/", weather_server.uri()))
                .expect("Failed to parse mock server uri");
            let api_key = Secret::new(WEATHER_API_KEY.into());

            WeatherClient::new(api_base_url, api_key, Duration::from_secs(2))
                .expect("Failed to create weather client")
        };

        let server = app::run(listener, subscription_service, weather_client)
            .expect("Failed to spawn app instance");
        let _ = tokio::spawn(server);

        let client = Client::new();

        Self {
            addr,
            pool,
            client,
            email_server,
            weather_server,
        }
    }

    pub fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", &self.addr, url);
        self.client.request(method, url)
    }

    pub async fn health_check(&self) -> reqwest::Result<Response> {
        self.request(Method::GET, "health_check").send().await
    }

    pub async fn subscribe(&self, new_subscriber: &NewSubscriber) -> reqwest::Result<Response> {
        self.request(Method::POST, "api/subscribe")
            .json(new_subscriber)
            .send()
            .await
    }

    pub async fn confirm(&self, token: &str) -> reqwest::Result<Response> {
        self.request(Method::GET, &format!("api/confirm/{}", token))
            .send()
            .await
    }

    pub async fn unsubscribe(&self, token: &str) -> reqwest::Result<Response> {
        self.request(Method::GET, &format!("api/unsubscribe/{}", token))
            .send()
            .await
    }

    pub async fn forecast(&self, query: &[(&str, &str)]) -> reqwest::Result<Response> {
        self.request(Method::GET, "api/forecast")
            .query(query)
            .send()
            .await
    }

    pub async fn autocomplete(&self, query: &str) -> reqwest::Result<Response> {
        self.request(Method::GET, "api/autocomplete")
            .query(&[("q", query)])
            .send()
            .await
    }

    pub async fn current_weather(&self, city: &str) -> reqwest::Result<Response> {
        self.request(Method::GET, "api/weather")
            .query(&[("city", city)])
            .send()
            .await
    }

    /// Every stored subscription row
    pub async fn subscriptions(&self) -> Vec<Subscription> {
        sqlx::query_as::<_, Subscription>("select * from subscriptions order by id")
            .fetch_all(&self.pool)
            .await
            .expect("Failed to fetch subscriptions")
    }

    /// Token from the confirmation link of the `n`th email sent
    pub async fn confirmation_token(&self, n: usize) -> String {
        let requests = self.email_server.received_requests().await.unwrap();
        let email_request = &requests[n];

        let body: serde_json::Value = serde_json::from_slice(&email_request.body).unwrap();
        let link = extract_email_link(body["TextBody"].as_str().unwrap());

        let link = Url::parse(&link).unwrap();
        assert_eq!(link.host_str(), Some("127.0.0.1"));
        link.path_segments().unwrap().last().unwrap().to_string()
    }
}

pub fn extract_email_link(body: &str) -> String {
    let links: Vec<_> = linkify::LinkFinder::new()
        .links(body)
        .filter(|l| *l.kind() == linkify::LinkKind::Url)
        .collect();
    assert_eq!(1, links.len());
    links[0].as_str().to_string()
}
