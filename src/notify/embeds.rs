use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::fmt;

/// The user who started a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    /// Account name
    pub name: String,
    /// Name shown in replies
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Requester {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            avatar_url: None,
        }
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Where a search was started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Server {
        name: String,
        channel: String,
        member_count: u64,
    },
    DirectMessage,
}

impl Origin {
    pub fn server_name(&self) -> &str {
        match self {
            Origin::Server { name, .. } => name,
            Origin::DirectMessage => "Direct Message",
        }
    }

    pub fn channel_name(&self) -> &str {
        match self {
            Origin::Server { channel, .. } => channel,
            Origin::DirectMessage => "Direct Message",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchNotice {
    pub requester: Requester,
    pub term: String,
    pub origin: Origin,
}

/// Details about a server the bot was added to
#[derive(Debug, Clone)]
pub struct ServerJoinNotice {
    pub id: u64,
    pub name: String,
    /// Owner name, when it could be looked up
    pub owner: Option<String>,
    pub owner_id: u64,
    pub member_count: u64,
    pub role_count: usize,
    pub text_channels: usize,
    pub voice_channels: usize,
    pub categories: usize,
    pub created_at: DateTime<Utc>,
    pub region: Option<String>,
    pub emojis: Vec<String>,
    pub icon_url: Option<String>,
    /// Servers the bot is in after joining this one
    pub total_servers: usize,
    pub channel_names: Vec<String>,
    pub member_names: Vec<String>,
}

impl ServerJoinNotice {
    pub fn owner_display(&self) -> &str {
        self.owner
            .as_deref()
            .unwrap_or("Owner information unavailable")
    }
}

fn field(name: &str, value: impl Into<String>) -> Value {
    json!({ "name": name, "value": value.into(), "inline": false })
}

/// Embed announcing a search
pub fn search_embed(notice: &SearchNotice, now: DateTime<Utc>) -> Value {
    let server_info = match &notice.origin {
        Origin::Server {
            name, member_count, ..
        } => format!("**Name:** {}\n**Members:** {}", name, member_count),
        Origin::DirectMessage => "Direct Message".to_string(),
    };
    let avatar = notice.requester.avatar_url.as_deref();

    let mut embed = json!({
        "title": "🔍 New Search Performed",
        "description": format!("**User:** {}\n**Term:** `{}`", notice.requester, notice.term),
        "color": 3447003,
        "fields": [field("Server or DM", server_info)],
        "footer": { "text": format!("{} initiated", notice.requester) },
        "timestamp": now.to_rfc3339(),
    });
    if let Some(url) = avatar {
        embed["thumbnail"] = json!({ "url": url });
        embed["footer"]["icon_url"] = json!(url);
    }
    embed
}

/// Embed announcing that the bot joined a server
pub fn server_join_embed(notice: &ServerJoinNotice) -> Value {
    let emojis = if notice.emojis.is_empty() {
        "No custom emojis".to_string()
    } else {
        notice.emojis.join(" ")
    };

    let mut embed = json!({
        "title": "🤖 Bot Added to Server",
        "description": "The bot has been added to a new server!",
        "color": 3066993,
        "fields": [
            field("🌐 Server Name", notice.name.as_str()),
            field("🆔 Server ID", notice.id.to_string()),
            field(
                "👑 Owner",
                format!("{} (ID: {})", notice.owner_display(), notice.owner_id),
            ),
            field("👥 Member Count", notice.member_count.to_string()),
            field("🎭 Role Count", notice.role_count.to_string()),
            field(
                "💬 Channel Count",
                format!(
                    "Text: {}, Voice: {}, Categories: {}",
                    notice.text_channels, notice.voice_channels, notice.categories
                ),
            ),
            field(
                "📅 Server Creation Date",
                notice.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
            field(
                "🌍 Server Region",
                notice
                    .region
                    .as_deref()
                    .unwrap_or("Server region information not available."),
            ),
            field("😃 Server Emojis", emojis),
        ],
        "footer": { "text": format!("Bot is now in {} servers", notice.total_servers) },
    });
    if let Some(ref url) = notice.icon_url {
        embed["thumbnail"] = json!({ "url": url });
    }
    embed
}
