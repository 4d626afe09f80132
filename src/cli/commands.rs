use std::fmt::Write as _;
use std::io::{self, Read};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::{Intent, Session, ViewModel};
use crate::notes::NoteId;

const PREVIEW_COLUMNS: usize = 72;

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Note text. If omitted, reads from stdin.
    #[arg()]
    pub text: Vec<String>,
    /// Pin the new note
    #[arg(long)]
    pub pin: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only show notes containing this text (case-insensitive)
    #[arg(long, short)]
    pub search: Option<String>,
    /// Print the view model as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// 1-based position as shown by `list`
    pub position: usize,
    /// Replacement text. Blank text deletes the note.
    #[arg(required = true)]
    pub text: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PositionArgs {
    /// 1-based position as shown by `list`
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    Show,
    Toggle,
}

#[derive(Args, Debug, Clone)]
pub struct ThemeArgs {
    #[arg(value_enum, default_value_t = ThemeAction::Show)]
    pub action: ThemeAction,
}

pub fn add(session: &mut Session, args: AddArgs) -> Result<()> {
    let content = if args.text.is_empty() {
        read_stdin()?.unwrap_or_default()
    } else {
        args.text.join(" ")
    };
    let now = Instant::now();
    let id = session
        .dispatch(
            Intent::Add {
                content,
                pinned: args.pin,
            },
            now,
        )
        .created()
        .context("creating note")?;
    session.dispatch(Intent::EndEdit { id }, now);
    if session.store().get(id).is_none() {
        println!("Nothing to save: note was empty.");
    } else {
        println!("Added note{}", if args.pin { " (pinned)" } else { "" });
    }
    Ok(())
}

pub fn list(session: &mut Session, args: ListArgs) -> Result<()> {
    if let Some(query) = args.search {
        session.dispatch(Intent::Search { query }, Instant::now());
    }
    let view = session.view(local_now());
    if args.json {
        let json = serde_json::to_string_pretty(&view).context("serializing notes view")?;
        println!("{json}");
    } else {
        print!("{}", render_list(&view));
    }
    Ok(())
}

pub fn edit(session: &mut Session, args: EditArgs) -> Result<()> {
    let id = resolve_position(session, args.position)?;
    let now = Instant::now();
    session.dispatch(Intent::BeginEdit { id }, now);
    session.dispatch(
        Intent::Edit {
            id,
            content: args.text.join(" "),
        },
        now,
    );
    session.dispatch(Intent::EndEdit { id }, now);
    if session.store().get(id).is_none() {
        println!("Removed note {} (left empty)", args.position);
    } else {
        println!("Updated note {}", args.position);
    }
    Ok(())
}

pub fn set_pinned(session: &mut Session, args: PositionArgs, pinned: bool) -> Result<()> {
    let id = resolve_position(session, args.position)?;
    session.dispatch(Intent::SetPinned { id, pinned }, Instant::now());
    Ok(())
}

pub fn delete(session: &mut Session, args: PositionArgs) -> Result<()> {
    let id = resolve_position(session, args.position)?;
    session.dispatch(Intent::Delete { id }, Instant::now());
    Ok(())
}

pub fn theme(session: &mut Session, args: ThemeArgs) -> Result<()> {
    if args.action == ThemeAction::Toggle {
        session.dispatch(Intent::ToggleTheme, Instant::now());
    }
    println!("{}", session.theme());
    Ok(())
}

fn resolve_position(session: &Session, position: usize) -> Result<NoteId> {
    let notes = session.store().all();
    if position == 0 || position > notes.len() {
        bail!(
            "no note at position {position} (there are {} notes)",
            notes.len()
        );
    }
    Ok(notes[position - 1].id())
}

fn local_now() -> time::OffsetDateTime {
    time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc())
}

pub fn render_list(view: &ViewModel) -> String {
    if let Some(message) = view.empty_message() {
        return format!("{message}\n");
    }
    let mut out = String::new();
    for (index, note) in view.notes.iter().enumerate() {
        if !note.visible {
            continue;
        }
        let mut headline = format!("{}. ", index + 1);
        if note.pinned {
            headline.push_str("[pinned] ");
        }
        let first_line = note.rendered_text.lines().next().unwrap_or_default();
        // truncating could split a highlight marker, so only plain text is cut
        if note.rendered_text == note.content {
            headline.push_str(&truncate_columns(first_line, PREVIEW_COLUMNS));
        } else {
            headline.push_str(first_line);
        }
        if note.content.lines().nth(1).is_some() {
            headline.push_str(" (+)");
        }
        let _ = writeln!(&mut out, "{headline}");
        let _ = writeln!(&mut out, "   {}", note.timestamp_label);
    }
    out
}

fn truncate_columns(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for grapheme in text.graphemes(true) {
        let grapheme_width = grapheme.width();
        if width + grapheme_width > max.saturating_sub(1) {
            break;
        }
        out.push_str(grapheme);
        width += grapheme_width;
    }
    out.push('…');
    out
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading note text from stdin")?;
    Ok(Some(buf))
}
