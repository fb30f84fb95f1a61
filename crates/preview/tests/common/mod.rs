use chrono::Utc;

use cadenza_core::project::{Project, ProjectStatus, Version};

/// A waiting project with two versions, the second recommended.
pub fn sample_project(id: &str) -> Project {
    let now = Utc::now();
    Project {
        id: id.to_string(),
        client_name: "Ana Souza".to_string(),
        client_email: "ana@example.com".to_string(),
        title: "Música de aniversário".to_string(),
        status: ProjectStatus::Waiting,
        versions: vec![
            Version {
                id: "v1".to_string(),
                name: "Versão 1".to_string(),
                description: None,
                audio_url: "https://cdn.cadenza.test/v1.mp3".to_string(),
                recommended: false,
            },
            Version {
                id: "v2".to_string(),
                name: "Versão 2".to_string(),
                description: Some("Com cordas".to_string()),
                audio_url: "https://cdn.cadenza.test/v2.mp3".to_string(),
                recommended: true,
            },
        ],
        feedback_history: Vec::new(),
        created_at: now,
        expires_at: None,
        last_activity_at: now,
        revision: 0,
    }
}
