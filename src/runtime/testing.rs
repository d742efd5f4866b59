//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::{InMemorySessionStore, RuntimeManager};
use crate::state_machine::ChatId;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Mock Transport
// ============================================================================

/// One message the bot tried to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Prompt {
        chat_id: ChatId,
        text: String,
        menu: Vec<String>,
    },
    Text {
        chat_id: ChatId,
        text: String,
    },
}

impl Outbound {
    pub fn chat_id(&self) -> ChatId {
        match self {
            Outbound::Prompt { chat_id, .. } | Outbound::Text { chat_id, .. } => *chat_id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Outbound::Prompt { text, .. } | Outbound::Text { text, .. } => text,
        }
    }
}

/// Transport that records every delivery and streams it to the test
pub struct MockTransport {
    /// Record of all deliveries
    pub sent: Mutex<Vec<Outbound>>,
    outbound_tx: mpsc::UnboundedSender<Outbound>,
}

impl MockTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let transport = Self {
            sent: Mutex::new(Vec::new()),
            outbound_tx,
        };
        (transport, outbound_rx)
    }

    fn record(&self, outbound: Outbound) {
        self.sent.lock().unwrap().push(outbound.clone());
        let _ = self.outbound_tx.send(outbound);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_prompt(
        &self,
        chat_id: ChatId,
        text: &str,
        menu: &[&str],
    ) -> Result<(), TransportError> {
        self.record(Outbound::Prompt {
            chat_id,
            text: text.to_string(),
            menu: menu.iter().map(|label| (*label).to_string()).collect(),
        });
        Ok(())
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        self.record(Outbound::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Transport whose every delivery fails
pub struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    async fn send_prompt(
        &self,
        _chat_id: ChatId,
        _text: &str,
        _menu: &[&str],
    ) -> Result<(), TransportError> {
        Err(TransportError::new("network unreachable"))
    }

    async fn send_text(&self, _chat_id: ChatId, _text: &str) -> Result<(), TransportError> {
        Err(TransportError::new("network unreachable"))
    }
}

// ============================================================================
// Test Harness
// ============================================================================

/// Manager wired to an isolated store and a recording transport
pub struct TestBot {
    pub manager: Arc<RuntimeManager<InMemorySessionStore, MockTransport>>,
    pub store: Arc<InMemorySessionStore>,
    pub transport: Arc<MockTransport>,
    outbound_rx: mpsc::UnboundedReceiver<Outbound>,
}

impl TestBot {
    pub fn new() -> Self {
        let store = Arc::new(InMemorySessionStore::new());
        let (transport, outbound_rx) = MockTransport::new();
        let transport = Arc::new(transport);
        let manager = Arc::new(RuntimeManager::new(store.clone(), transport.clone()));
        Self {
            manager,
            store,
            transport,
            outbound_rx,
        }
    }

    pub async fn begin(&self, chat_id: i64) {
        self.manager
            .on_begin(ChatId(chat_id))
            .await
            .expect("Failed to send begin");
    }

    pub async fn say(&self, chat_id: i64, text: &str) {
        self.manager
            .on_message(ChatId(chat_id), text)
            .await
            .expect("Failed to send message");
    }

    /// Wait for the next `n` deliveries
    pub async fn next_outbound(&mut self, n: usize) -> Vec<Outbound> {
        let mut received = Vec::with_capacity(n);
        while received.len() < n {
            match tokio::time::timeout(Duration::from_secs(10), self.outbound_rx.recv()).await {
                Ok(Some(outbound)) => received.push(outbound),
                _ => panic!("Timed out after {} of {n} deliveries", received.len()),
            }
        }
        received
    }

    /// Wait for the chat's session to be removed; deletion trails the last reply
    pub async fn wait_session_gone(&self, chat_id: i64) {
        for _ in 0..80 {
            if self.store.get(ChatId(chat_id)).await.unwrap().is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("Session for chat {chat_id} was never removed");
    }

    /// Assert nothing else gets delivered for a short while
    pub async fn expect_silence(&mut self) {
        let result =
            tokio::time::timeout(Duration::from_millis(100), self.outbound_rx.recv()).await;
        assert!(result.is_err(), "Unexpected delivery: {result:?}");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts;
    use crate::recipes::recipe_text;
    use crate::state_machine::state::MealType;
    use crate::state_machine::state::Stage;
    use crate::state_machine::Session;

    const METRICS: &str = "КБЖУ + вода + активность";

    #[tokio::test]
    async fn test_begin_sends_greeting_and_menu() {
        let mut bot = TestBot::new();
        bot.begin(1).await;

        let out = bot.next_outbound(2).await;
        assert_eq!(
            out[0],
            Outbound::Text {
                chat_id: ChatId(1),
                text: prompts::GREETING.to_string()
            }
        );
        assert_eq!(
            out[1],
            Outbound::Prompt {
                chat_id: ChatId(1),
                text: "Выберите консультацию:".to_string(),
                menu: vec![METRICS.to_string(), "ПП рецепты".to_string()],
            }
        );
        assert_eq!(
            bot.store.get(ChatId(1)).await.unwrap(),
            Some(Session::new())
        );
        assert_eq!(bot.transport.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_full_metrics_scenario() {
        let mut bot = TestBot::new();
        bot.begin(7).await;
        for input in [
            METRICS,
            "Anna",
            "30",
            "70",
            "170",
            "высокий",
            "просто узнать норму",
        ] {
            bot.say(7, input).await;
        }

        // greeting + menu + one reply per input
        let out = bot.next_outbound(9).await;
        let summary = out.last().unwrap().text();
        assert!(summary.contains("1452 ккал"), "{summary}");
        assert!(summary.contains("2.1 л/день"), "{summary}");
        assert!(summary.contains("10000 шагов/день"), "{summary}");
        bot.wait_session_gone(7).await;

        // Further messages are ignored until a new start
        bot.say(7, "hello").await;
        bot.expect_silence().await;
        bot.begin(7).await;
        let out = bot.next_outbound(1).await;
        assert_eq!(out[0].text(), prompts::GREETING);
    }

    #[tokio::test]
    async fn test_recipe_scenario() {
        let mut bot = TestBot::new();
        bot.begin(3).await;
        bot.say(3, "ПП рецепты").await;
        bot.say(3, "Завтрак").await;

        let out = bot.next_outbound(4).await;
        assert_eq!(out[2].text(), "Выберите прием пищи:");
        assert_eq!(
            out[3],
            Outbound::Text {
                chat_id: ChatId(3),
                text: recipe_text(MealType::Breakfast).to_string()
            }
        );
        bot.wait_session_gone(3).await;
    }

    #[tokio::test]
    async fn test_invalid_age_reprompts() {
        let mut bot = TestBot::new();
        bot.begin(5).await;
        bot.say(5, METRICS).await;
        bot.say(5, "Anna").await;
        bot.say(5, "abc").await;

        let out = bot.next_outbound(5).await;
        assert_eq!(out[3].text(), out[4].text());
        assert_eq!(out[4].text(), "Сколько вам лет? (введите число)");

        let session = bot.store.get(ChatId(5)).await.unwrap().unwrap();
        assert_eq!(session.stage, Stage::AwaitingAge);
        assert_eq!(session.data.age, None);
    }

    #[tokio::test]
    async fn test_input_is_trimmed_before_matching() {
        let mut bot = TestBot::new();
        bot.begin(6).await;
        bot.say(6, "  ПП рецепты \n").await;

        let out = bot.next_outbound(3).await;
        assert_eq!(out[2].text(), "Выберите прием пищи:");
    }

    #[tokio::test]
    async fn test_message_without_session_is_ignored() {
        let mut bot = TestBot::new();
        bot.say(9, "hello").await;
        bot.expect_silence().await;
        assert_eq!(bot.store.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_chats_are_independent() {
        let mut bot = TestBot::new();
        bot.begin(1).await;
        bot.begin(2).await;
        bot.say(1, METRICS).await;
        bot.say(2, "ПП рецепты").await;

        let out = bot.next_outbound(6).await;
        let for_chat = |id: i64| -> Vec<String> {
            out.iter()
                .filter(|o| o.chat_id() == ChatId(id))
                .map(|o| o.text().to_string())
                .collect()
        };
        assert_eq!(for_chat(1).last().unwrap(), "Как вас зовут?");
        assert_eq!(for_chat(2).last().unwrap(), "Выберите прием пищи:");
        assert_eq!(bot.manager.runtime_count().await, 2);
    }

    #[tokio::test]
    async fn test_burst_of_messages_is_processed_in_order() {
        let mut bot = TestBot::new();
        bot.begin(4).await;
        // Dispatch without awaiting replies in between
        let manager = bot.manager.clone();
        let burst = tokio::spawn(async move {
            for input in [METRICS, "Anna", "30", "70", "170", "низкий", "похудеть"] {
                manager.on_message(ChatId(4), input).await.unwrap();
            }
        });
        burst.await.unwrap();

        let out = bot.next_outbound(9).await;
        let texts: Vec<&str> = out.iter().map(Outbound::text).collect();
        assert_eq!(
            &texts[2..8],
            &[
                "Как вас зовут?",
                "Сколько вам лет? (введите число)",
                "Ваш вес в килограммах?",
                "Ваш рост в сантиметрах?",
                "Уровень активности?",
                "Ваша цель?",
            ]
        );
        // 1451.5 * 0.85 = 1233.775
        assert!(texts[8].contains("1234 ккал"));
    }

    #[tokio::test]
    async fn test_delivery_failure_still_ends_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = RuntimeManager::new(store.clone(), Arc::new(FailingTransport));

        manager.on_begin(ChatId(1)).await.unwrap();
        manager.on_message(ChatId(1), "ПП рецепты").await.unwrap();
        manager.on_message(ChatId(1), "Обед").await.unwrap();

        // The runtime keeps going after failed sends; wait for it to settle
        let mut ended = false;
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(25)).await;
            if store.get(ChatId(1)).await.unwrap().is_none() && manager.runtime_count().await == 1 {
                ended = true;
                break;
            }
        }
        assert!(ended, "session was not removed");
    }

    #[tokio::test]
    async fn test_sweep_expires_idle_sessions_and_retires_runtimes() {
        let mut bot = TestBot::new();
        bot.begin(1).await;
        bot.begin(2).await;
        bot.next_outbound(4).await;

        bot.store
            .set_touched_at(
                ChatId(1),
                Session::new(),
                chrono::Utc::now() - chrono::Duration::hours(3),
            )
            .await;

        let report = bot.manager.sweep(Duration::from_secs(3600)).await.unwrap();
        assert_eq!(report.expired_sessions, vec![ChatId(1)]);
        assert_eq!(report.retired_runtimes, 1);
        assert_eq!(bot.manager.runtime_count().await, 1);

        // Chat 1 is gone; chat 2 keeps going
        bot.say(1, METRICS).await;
        bot.say(2, METRICS).await;
        let out = bot.next_outbound(1).await;
        assert_eq!(out[0].chat_id(), ChatId(2));
        bot.expect_silence().await;
    }

    #[tokio::test]
    async fn test_retired_chat_can_start_again() {
        let mut bot = TestBot::new();
        bot.begin(8).await;
        bot.say(8, "ПП рецепты").await;
        bot.say(8, "Ужин").await;
        bot.next_outbound(4).await;
        bot.wait_session_gone(8).await;

        assert_eq!(bot.manager.retire_idle_runtimes().await.unwrap(), 1);
        assert_eq!(bot.manager.runtime_count().await, 0);

        bot.begin(8).await;
        let out = bot.next_outbound(2).await;
        assert_eq!(out[0].text(), prompts::GREETING);
        assert_eq!(bot.manager.runtime_count().await, 1);
    }
}
