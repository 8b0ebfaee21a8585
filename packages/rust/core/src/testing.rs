//! Fixtures shared by the unit tests of this crate.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use wiremock::MockServer;

use rfctrans_shared::{
    AppConfig, DocumentMeta, Paragraph, PathsConfig, Result, RfcDocument, RfcId, RfcTransError,
    Section, SourcesConfig, TranslatorConfig,
};

use crate::pipeline::SilentProgress;
use crate::translate::{Translator, translate_rfc};
use crate::workspace::Workspace;

pub const RFC_TEXT: &str = "\
Network Working Group                                          J. Postel
Request for Comments: 791                                            ISI
                                                          September 1981

                           INTERNET PROTOCOL

1.  INTRODUCTION

   The Internet Protocol is designed for use in interconnected systems.
";

/// Workspace rooted in `dir`, fetching from `server`, translating with [`EchoTranslator`].
pub fn workspace(dir: &Path, server: &MockServer) -> Workspace {
    let config = AppConfig {
        paths: PathsConfig {
            data_dir: dir.join("data"),
            html_dir: dir.join("html"),
        },
        sources: SourcesConfig {
            timeout_secs: 5,
            ..SourcesConfig::rooted_at(&server.uri())
        },
        translator: TranslatorConfig {
            endpoint: format!("{}/translate_a/single", server.uri()),
            delay_ms: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    Workspace::new(config)
        .unwrap()
        .with_translator(EchoTranslator::default())
}

/// Prefixes every input with `[ja] ` and remembers what it was asked.
#[derive(Default)]
pub struct EchoTranslator {
    inputs: Mutex<Vec<String>>,
}

impl EchoTranslator {
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for EchoTranslator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn translate(&self, text: &str) -> Result<String> {
        self.inputs.lock().unwrap().push(text.to_string());
        Ok(format!("[ja] {text}"))
    }
}

/// Succeeds `n` times, then fails every call.
pub struct FailingTranslator {
    remaining: AtomicUsize,
}

impl FailingTranslator {
    pub fn after(n: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(n),
        }
    }
}

#[async_trait]
impl Translator for FailingTranslator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn translate(&self, text: &str) -> Result<String> {
        let left = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match left {
            Ok(_) => Ok(format!("[ja] {text}")),
            Err(_) => Err(RfcTransError::Translation("backend unavailable".into())),
        }
    }
}

/// Two sections: an abstract with a wrapped paragraph, and an introduction
/// whose second paragraph is a figure.
pub fn sample_document(number: u32) -> RfcDocument {
    RfcDocument {
        id: RfcId::number(number),
        title: "The TLS Protocol".into(),
        published: None,
        meta: DocumentMeta::default(),
        sections: vec![
            Section {
                id: "abstract".into(),
                title: "Abstract".into(),
                paragraphs: vec![Paragraph::text(3, "first line\n   second line")],
            },
            Section {
                id: "1".into(),
                title: "Introduction".into(),
                paragraphs: vec![
                    Paragraph::text(3, "TLS secures traffic between two peers."),
                    Paragraph::raw(3, "+--+\n|  |\n+--+"),
                ],
            },
        ],
        fetched_at: Utc::now(),
    }
}

/// Store `doc` and translate all of it.
pub async fn translate_fully(ws: &Workspace, doc: &RfcDocument) {
    ws.store().save_document(doc).unwrap();
    translate_rfc(ws.store(), ws.translator(), &doc.id, false, &SilentProgress)
        .await
        .unwrap();
}
