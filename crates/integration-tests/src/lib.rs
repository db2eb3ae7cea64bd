//! End-to-end test harness for the vape shop.
//!
//! Each test starts the real storefront and admin routers on loopback ports,
//! wired to in-process fakes of every upstream service:
//!
//! - [`FakeDatabase`] for the Realtime Database REST API
//! - [`FakeIdentity`] for Identity Toolkit sign-up and sign-in
//! - [`FakeSumUp`] for the payments API
//! - a Cloudinary unsigned-upload endpoint
//!
//! Nothing leaves the machine, so the suite runs with a plain `cargo test`.

pub mod fake_db;
pub mod fakes;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use reqwest::redirect::Policy;
use secrecy::SecretString;
use vapeshop_core::{Email, Phone};
use vapeshop_firebase::{DatabaseConfig, IdentityConfig};

pub use fake_db::FakeDatabase;
pub use fakes::{FakeIdentity, FakeSumUp, SumUpCall};

/// Admin account seeded into every harness.
pub const ADMIN_EMAIL: &str = "owner@vapeshop.test";
/// Password of [`ADMIN_EMAIL`].
pub const ADMIN_PASSWORD: &str = "correct horse battery";
/// Shop number customers are handed off to.
pub const SHOP_WHATSAPP: &str = "+44 7700 900123";
/// Merchant code configured for the SumUp proxy.
pub const MERCHANT_CODE: &str = "MTEST42";
/// Bearer token configured for the SumUp proxy.
pub const SUMUP_TOKEN: &str = "sup_sk_test_token";

/// Bind `router` to an ephemeral loopback port and return its base URL.
///
/// Connection info is attached so the storefront rate limiter can key on
/// the peer address.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server");
    });
    format!("http://{addr}")
}

/// Browser-like client: keeps cookies, does not follow redirects.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("build HTTP client")
}

/// Running fakes shared by both applications.
pub struct Upstreams {
    pub db: FakeDatabase,
    pub db_url: String,
    pub identity: FakeIdentity,
    pub identity_url: String,
    pub sumup: FakeSumUp,
    pub sumup_url: String,
    pub cloudinary_url: String,
}

impl Upstreams {
    /// Start every fake and seed the admin account.
    pub async fn start() -> Self {
        let db = FakeDatabase::new();
        let identity = FakeIdentity::new();
        let sumup = FakeSumUp::new();
        identity.add_account(ADMIN_EMAIL, ADMIN_PASSWORD);

        Self {
            db_url: serve(db.router()).await,
            identity_url: serve(identity.router()).await,
            sumup_url: serve(sumup.router()).await,
            cloudinary_url: serve(fakes::cloudinary_router()).await,
            db,
            identity,
            sumup,
        }
    }

    fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.db_url.clone(),
            secret: None,
        }
    }

    fn identity_config(&self) -> IdentityConfig {
        IdentityConfig {
            api_key: SecretString::from("test-api-key"),
            base_url: self.identity_url.clone(),
        }
    }

    /// Admin configuration pointing at the fakes.
    #[must_use]
    pub fn admin_config(&self) -> vapeshop_admin::config::AdminConfig {
        use vapeshop_admin::config::{AdminConfig, CloudinaryConfig, FirebaseConfig, SumUpConfig};

        AdminConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            firebase: FirebaseConfig {
                database: self.database_config(),
                identity: self.identity_config(),
            },
            admin_emails: vec![Email::parse(ADMIN_EMAIL).expect("admin email")],
            cloudinary: Some(CloudinaryConfig {
                cloud_name: "vapeshop-test".to_string(),
                upload_preset: "catalog_unsigned".to_string(),
                base_url: self.cloudinary_url.clone(),
            }),
            sumup: SumUpConfig {
                base_url: self.sumup_url.clone(),
                bearer_token: Some(SecretString::from(SUMUP_TOKEN)),
                merchant_code: Some(MERCHANT_CODE.to_string()),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Storefront configuration pointing at the fakes.
    #[must_use]
    pub fn storefront_config(
        &self,
        catalog_fallback_path: PathBuf,
    ) -> vapeshop_storefront::config::StorefrontConfig {
        use vapeshop_storefront::config::{FirebaseConfig, StorefrontConfig};

        StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            firebase: FirebaseConfig {
                database: self.database_config(),
                identity: self.identity_config(),
            },
            whatsapp_number: Phone::parse(SHOP_WHATSAPP).expect("shop phone"),
            catalog_fallback_path,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

/// A running application plus a client with its own cookie jar.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Serve the admin panel built from `config`.
    pub async fn admin(config: vapeshop_admin::config::AdminConfig) -> Self {
        let state = vapeshop_admin::state::AppState::new(config).expect("admin state");
        Self {
            base_url: serve(vapeshop_admin::app(state)).await,
            client: browser(),
        }
    }

    /// Serve the storefront built from `config`.
    pub async fn storefront(config: vapeshop_storefront::config::StorefrontConfig) -> Self {
        let state = vapeshop_storefront::state::AppState::new(config).expect("storefront state");
        Self {
            base_url: serve(vapeshop_storefront::app(state)).await,
            client: browser(),
        }
    }

    /// Absolute URL for a path on this app.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET` a path.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    /// `POST` a urlencoded form to a path.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request")
    }

    /// Sign in through the login form; panics unless it lands on `/`.
    pub async fn sign_in_admin(&self) {
        let response = self
            .post_form(
                "/auth/login",
                &[("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD)],
            )
            .await;
        assert_eq!(location(&response), "/", "admin sign-in failed");
    }
}

/// `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// A small two-section catalog in database form.
#[must_use]
pub fn sample_catalog() -> serde_json::Value {
    serde_json::json!({
        "sections": {
            "devices": {
                "name": "Devices",
                "order": 0,
                "brands": [
                    {
                        "name": "Vaporesso",
                        "logo": "",
                        "website": "https://www.vaporesso.com",
                        "description": "Pod systems.",
                        "lines": [
                            {
                                "name": "Xros",
                                "image": "",
                                "products": [
                                    { "name": "Xros 3", "description": "Pod kit.", "flavor": "", "images": [] }
                                ]
                            }
                        ]
                    }
                ]
            },
            "liquids": {
                "name": "Liquids",
                "order": 1,
                "brands": [
                    {
                        "name": "Nasty Juice",
                        "logo": "",
                        "website": "",
                        "description": "Malaysian e-liquids.",
                        "lines": [
                            {
                                "name": "Double Fruity",
                                "image": "",
                                "products": [
                                    { "name": "Green Ape", "description": "Apple.", "flavor": "Apple", "images": [] }
                                ]
                            }
                        ]
                    },
                    {
                        "name": "Dinner Lady",
                        "logo": "",
                        "website": "",
                        "description": "",
                        "lines": []
                    }
                ]
            }
        }
    })
}
