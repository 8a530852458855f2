//! Prompt text for the companion. Output language is Spanish, matching the
//! stored emotion and diagnosis labels.

use super::{DayDiagnostic, DayNote, PhraseRequest};
use std::fmt::Write;

pub const PHRASE_SYSTEM: &str = "Eres un acompañante emocional cálido. Escribes frases breves, \
     concretas y sin clichés, en español, sin comillas ni emojis.";

pub const COMPANION_SYSTEM: &str = "Eres Mindful+, un acompañante emocional cálido y empático. \
     Responde con amabilidad, comprensión y sin juicios. No te presentes en cada mensaje, \
     solo continúa la conversación como un amigo que recuerda lo anterior.";

pub const RECOMMENDATION_SYSTEM: &str = "Eres un profesional de la salud mental que escribe \
     recomendaciones diarias breves, cálidas y accionables. No diagnosticas ni recetas; \
     si detectas riesgo, sugieres buscar ayuda profesional.";

pub const COMPANION_NAME: &str = "Mindful+";

pub fn phrase_prompt(request: &PhraseRequest) -> String {
    let mut prompt = format!(
        "Diagnóstico de hoy: {}.\nEmociones: {}.\nMi día: {}.\n",
        request.diagnosis,
        join_or_none(&request.emotions),
        join_or_none(&request.day_tags),
    );
    if !request.note.trim().is_empty() {
        let _ = writeln!(prompt, "Nota: {}", request.note.trim());
    }
    let _ = write!(
        prompt,
        "Escribe UNA frase del día de máximo {} caracteres que me acompañe.",
        request.max_chars
    );
    prompt
}

pub fn recommendation_prompt(
    display_name: &str,
    notes: &[DayNote],
    diagnostics: &[DayDiagnostic],
    max_chars: usize,
) -> String {
    let mut prompt = format!("Persona: {display_name}\n\nDiagnósticos de hoy:\n");
    if diagnostics.is_empty() {
        prompt.push_str("- (ninguno)\n");
    }
    for diagnostic in diagnostics {
        let _ = writeln!(
            prompt,
            "- puntuación {} ({}), emociones: {}, sueño: {}h",
            diagnostic.score,
            diagnostic.diagnosis,
            join_or_none(&diagnostic.emotions),
            diagnostic.sleep_hours
        );
    }

    prompt.push_str("\nNotas de hoy:\n");
    if notes.is_empty() {
        prompt.push_str("- (ninguna)\n");
    }
    for note in notes {
        let _ = writeln!(prompt, "- {}: {}", note.title, note.content);
    }

    let _ = write!(
        prompt,
        "\nEscribe una recomendación personalizada para hoy de máximo {max_chars} caracteres."
    );
    prompt
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "ninguna".to_string()
    } else {
        items.join(", ")
    }
}
