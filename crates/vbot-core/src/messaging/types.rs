/// Accent colour of a card. Adapters map this to their native colour type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Info,
    Progress,
    Success,
    Failure,
    Stats,
    Muted,
}

impl Tone {
    pub fn rgb(self) -> u32 {
        match self {
            Tone::Info => 0x3498db,
            Tone::Progress => 0xe67e22,
            Tone::Success => 0x2ecc71,
            Tone::Failure => 0xe74c3c,
            Tone::Stats => 0x9b59b6,
            Tone::Muted => 0x607d8b,
        }
    }
}

/// Discord's embed field limits, in characters.
pub const FIELD_NAME_MAX: usize = 256;
pub const FIELD_VALUE_MAX: usize = 1024;

/// Cut `text` to at most `max` characters, marking the cut with `…`.
fn clip(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        return text;
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A rich message (a Discord embed, in practice).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub description: Option<String>,
    pub tone: Tone,
    pub fields: Vec<CardField>,
    pub footer: Option<String>,
    pub thumbnail_url: Option<String>,
    pub timestamp: bool,
}

impl Card {
    pub fn new(title: impl Into<String>, tone: Tone) -> Self {
        Self {
            title: title.into(),
            description: None,
            tone,
            fields: Vec::new(),
            footer: None,
            thumbnail_url: None,
            timestamp: false,
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(CardField {
            name: clip(name.into(), FIELD_NAME_MAX),
            value: clip(value.into(), FIELD_VALUE_MAX),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    pub fn thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail_url = url;
        self
    }

    pub fn timestamped(mut self) -> Self {
        self.timestamp = true;
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// A URL button attached below a card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub emoji: Option<char>,
    pub url: String,
}

/// What the bot sends back through an interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Card(Card),
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }

    pub fn as_card(&self) -> Option<&Card> {
        match self {
            Reply::Card(c) => Some(c),
            Reply::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(s) => Some(s),
            Reply::Card(_) => None,
        }
    }
}

impl From<Card> for Reply {
    fn from(card: Card) -> Self {
        Reply::Card(card)
    }
}
