use std::env;

/// 決済ゲートウェイ接続設定
///
/// 認証情報はすべて環境変数から注入する。開発モードでは
/// ゲートウェイに接続せずモックのリダイレクトURLを返す。
#[derive(Clone)]
pub struct PaymentGatewayConfig {
    pub merchant_id: String,
    pub api_key: String,
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub currency: String,
    pub development_mode: bool,
}

// パスワードとAPIキーはログに出さない
impl std::fmt::Debug for PaymentGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGatewayConfig")
            .field("merchant_id", &self.merchant_id)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("currency", &self.currency)
            .field("development_mode", &self.development_mode)
            .finish_non_exhaustive()
    }
}

impl PaymentGatewayConfig {
    pub fn from_env() -> Result<Self, String> {
        let development_mode = env::var("PAYMENT_DEVELOPMENT_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let currency = env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "IQD".to_string());

        if development_mode {
            tracing::info!("Payment development mode enabled - using mock responses");
            return Ok(Self::development(currency));
        }

        let required = |name: &str| {
            env::var(name).map_err(|_| format!("{} must be set when not in development mode", name))
        };

        Ok(Self {
            merchant_id: required("PAYMENT_MERCHANT_ID")?,
            api_key: required("PAYMENT_API_KEY")?,
            base_url: required("PAYMENT_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            username: required("PAYMENT_USERNAME")?,
            password: required("PAYMENT_PASSWORD")?,
            currency,
            development_mode: false,
        })
    }

    /// 開発・テスト用（ゲートウェイには接続しない）
    pub fn development(currency: String) -> Self {
        Self {
            merchant_id: String::new(),
            api_key: String::new(),
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            currency,
            development_mode: true,
        }
    }

    /// 決済開始エンドポイント
    pub fn debit_url(&self) -> String {
        format!("{}/transaction/{}/debit", self.base_url, self.api_key)
    }
}
