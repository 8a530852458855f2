use chrono::{DateTime, Local, Utc};
use moodwell::core::directory::{Listing, ProfessionalProfile};
use moodwell::core::journal::{StoredDiagnostic, StoredNote};
use moodwell::core::offline::{ActionKind, QueuedAction, ReplayReport};
use std::fmt::Write;

const PREVIEW_CHARS: usize = 60;

fn local_time(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "sin fecha".to_string())
}

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut out: String = line.chars().take(PREVIEW_CHARS).collect();
    if line.chars().count() > PREVIEW_CHARS || text.lines().nth(1).is_some() {
        out.push('…');
    }
    out
}

pub fn render_notes(notes: &[StoredNote]) -> String {
    if notes.is_empty() {
        return "Aún no tienes notas.\n".to_string();
    }
    let mut out = String::new();
    for note in notes {
        let _ = writeln!(
            out,
            "{}  {}  {}",
            note.id,
            local_time(note.updated_at.or(note.created_at)),
            note.title
        );
        let _ = writeln!(out, "    {}", preview(&note.content));
    }
    out
}

pub fn render_note(note: &StoredNote) -> String {
    format!(
        "{}\n{}\n\n{}\n",
        note.title,
        local_time(note.updated_at.or(note.created_at)),
        note.content
    )
}

pub fn render_history(diagnostics: &[StoredDiagnostic]) -> String {
    if diagnostics.is_empty() {
        return "Aún no hay diagnósticos.\n".to_string();
    }
    let mut out = String::new();
    for diagnostic in diagnostics {
        let _ = writeln!(
            out,
            "{}  {:>3}  {}",
            local_time(diagnostic.created_at),
            diagnostic.score,
            diagnostic.diagnosis
        );
        if let Some(phrase) = diagnostic.phrase.as_deref() {
            let _ = writeln!(out, "    \"{phrase}\"");
        }
    }
    out
}

pub fn render_listings(listings: &[Listing]) -> String {
    if listings.is_empty() {
        return "No se encontraron profesionales con esos filtros.\n".to_string();
    }
    let mut out = String::new();
    for listing in listings {
        let profile = &listing.profile;
        let _ = writeln!(out, "{} ({})", profile.display_name(), listing.handle);
        let _ = writeln!(
            out,
            "    {} · {}, {} · tel. {}",
            profile.specialty, profile.municipality, profile.state, profile.phone
        );
    }
    out
}

pub fn render_profile(profile: &ProfessionalProfile) -> String {
    let mut out = String::new();
    let rows = [
        ("Nombre", profile.full_name.as_str()),
        ("Grado", profile.level.as_str()),
        ("Especialidad", profile.specialty.as_str()),
        ("Cédula", profile.cedula.as_str()),
        ("Teléfono", profile.phone.as_str()),
        ("Estado", profile.state.as_str()),
        ("Municipio", profile.municipality.as_str()),
        ("Propósito", profile.purpose.as_str()),
        ("Foto", profile.photo_url.as_deref().unwrap_or_default()),
    ];
    for (label, value) in rows {
        if !value.is_empty() {
            let _ = writeln!(out, "{label}: {value}");
        }
    }
    out
}

pub fn render_pending(pending: &[QueuedAction]) -> String {
    if pending.is_empty() {
        return "No hay acciones pendientes.\n".to_string();
    }

    let mut out = format!("{} acción(es) pendiente(s):\n", pending.len());
    for (index, action) in pending.iter().enumerate() {
        let summary = match &action.kind {
            ActionKind::Note => {
                let title = action.payload.get("title").and_then(|v| v.as_str());
                format!("nota \"{}\"", title.unwrap_or_default())
            }
            ActionKind::Diagnostic => {
                let score = action
                    .payload
                    .get("score")
                    .map(ToString::to_string)
                    .unwrap_or_default();
                format!("diagnóstico (puntuación {score})")
            }
            ActionKind::Unknown(raw) => format!("tipo desconocido \"{raw}\""),
        };
        let _ = writeln!(out, "  {}. {summary}", index + 1);
    }
    out
}

pub fn render_replay(report: &ReplayReport) -> String {
    if report.skipped {
        return "Ya hay una sincronización en curso.\n".to_string();
    }
    if report.attempted == 0 && report.still_pending() == 0 {
        return "Nada que sincronizar.\n".to_string();
    }

    let mut out = format!(
        "Sincronizadas {} de {} acción(es).\n",
        report.committed, report.attempted
    );
    if report.still_pending() > 0 {
        let _ = writeln!(out, "Siguen pendientes: {}.", report.still_pending());
    }
    out
}
