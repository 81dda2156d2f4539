//! Starter content written once for a brand-new user, so the first sign-in
//! lands on a populated journal instead of a blank screen. The exact content
//! is illustrative placeholder data, not a contract.

use chrono::{Duration, Utc};

use crate::models::insight::NewInsight;
use crate::models::journal::{Mood, NewJournalEntry};
use crate::models::reminder::{Frequency, NewReminder};
use crate::persistence::SeedData;

pub fn starter_content() -> SeedData {
    let now = Utc::now();

    let entries = vec![
        NewJournalEntry {
            date: now - Duration::days(2),
            text: "Felt a bit overwhelmed with work today, but managed to complete my top \
                   priorities. Took a short walk in the evening which helped clear my head."
                .to_string(),
            mood: Some(Mood::Okay),
            voice_note_url: None,
            image_url: None,
            tags: vec![
                "work".to_string(),
                "stress".to_string(),
                "self-care".to_string(),
            ],
        },
        NewJournalEntry {
            date: now - Duration::days(1),
            text: "Had a great conversation with an old friend. It's amazing how reconnecting \
                   can lift your spirits. Feeling grateful for good friends."
                .to_string(),
            mood: Some(Mood::Good),
            voice_note_url: None,
            image_url: None,
            tags: vec![
                "friends".to_string(),
                "gratitude".to_string(),
                "connection".to_string(),
            ],
        },
    ];

    let reminders = vec![
        NewReminder {
            title: "Morning Meditation".to_string(),
            time: "07:00".to_string(),
            frequency: Frequency::Daily,
            description: Some("10 minutes of mindfulness meditation.".to_string()),
            active: true,
        },
        NewReminder {
            title: "Gym Session".to_string(),
            time: "18:00".to_string(),
            frequency: Frequency::Weekdays,
            description: Some("Strength training workout.".to_string()),
            active: true,
        },
        NewReminder {
            title: "Weekly Review".to_string(),
            time: "16:00".to_string(),
            frequency: Frequency::Weekly,
            description: Some("Review journal and plan next week.".to_string()),
            active: false,
        },
    ];

    let insights = vec![NewInsight {
        generated_at: now - Duration::days(5),
        themes: vec!["Procrastination".to_string(), "Sleep Quality".to_string()],
        emotions: vec!["Anxious".to_string(), "Tired".to_string()],
        stressors: vec![
            "Upcoming project deadline".to_string(),
            "Late nights".to_string(),
        ],
        summary: "The past week shows a pattern of anxiety linked to work pressure and poor \
                  sleep. Procrastination appears to be a coping mechanism."
            .to_string(),
        recommendations: "Consider breaking down tasks and setting aside dedicated focus time. \
                          Aim for a consistent sleep schedule."
            .to_string(),
    }];

    SeedData {
        entries,
        reminders,
        insights,
    }
}
