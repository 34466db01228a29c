use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use medit_core::config::Config;
use medit_core::library::Library;
use medit_core::logging::init_logging;
use medit_core::paths::AppDirs;
use medit_core::record::{Record, RecordKind};
use medit_engine::editor::CommandEditor;
use medit_engine::prompt::ConsolePrompter;
use medit_engine::reconcile::RefField;
use medit_engine::session::EditSession;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "medit", version, about = "Bulk-edit music library metadata in a text editor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactively edit metadata for records matching a query
    Edit(EditCommand),
}

#[derive(Debug, Args)]
struct EditCommand {
    /// Query terms (`field:value` or a bare substring); empty matches all
    query: Vec<String>,
    /// Edit this field also (repeatable)
    #[arg(short = 'f', long = "field", value_name = "FIELD")]
    fields: Vec<String>,
    /// Edit all fields
    #[arg(long)]
    all: bool,
    /// Operate on albums instead of items
    #[arg(short = 'a', long)]
    album: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    let config = Config::load_or_default(&dirs)?;
    let _logging = init_logging(&config.logging, &dirs)?;

    match cli.command {
        Command::Edit(command) => run_edit(command, &config, &dirs),
    }
}

fn library_path(config: &Config, dirs: &AppDirs) -> PathBuf {
    config
        .library_path
        .clone()
        .unwrap_or_else(|| dirs.data_dir().join("library.json"))
}

fn run_edit(command: EditCommand, config: &Config, dirs: &AppDirs) -> Result<()> {
    let path = library_path(config, dirs);
    tracing::debug!(path = %path.display(), "opening library");
    let mut library = Library::open(&path)?;

    let mut editor = CommandEditor::from_config(config.edit.editor.as_deref())?;
    let mut prompter = ConsolePrompter;
    // Persisted records all have valid ids, so standalone edits
    // reconcile by id.
    let mut session = EditSession::new(&config.edit, &mut editor, &mut prompter, RefField::Id);

    let item_fields = session.fields_for(RecordKind::Item, &command.fields, command.all);
    let album_fields = session.fields_for(RecordKind::Album, &command.fields, command.all);

    if command.album {
        let mut albums = library.query_albums(&command.query);
        if albums.is_empty() {
            println!("Nothing to edit.");
            return Ok(());
        }
        let applied = {
            let mut objs: Vec<&mut dyn Record> = albums
                .iter_mut()
                .map(|album| album as &mut dyn Record)
                .collect();
            session.edit_objects(&mut objs, &item_fields, &album_fields)?
        };
        if applied {
            let saved = library.commit_albums(albums)?;
            println!("Saved {saved} album(s).");
        }
    } else {
        let mut items = library.query_items(&command.query);
        if items.is_empty() {
            println!("Nothing to edit.");
            return Ok(());
        }
        let applied = {
            let mut objs: Vec<&mut dyn Record> = items
                .iter_mut()
                .map(|item| item as &mut dyn Record)
                .collect();
            session.edit_objects(&mut objs, &item_fields, &album_fields)?
        };
        if applied {
            let saved = library.commit_items(items)?;
            println!("Saved {saved} item(s).");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_flag_is_repeatable() {
        let cli = Cli::parse_from(["medit", "edit", "-f", "year", "-f", "genre", "artist:band"]);
        let Command::Edit(command) = cli.command;
        assert_eq!(command.fields, vec!["year", "genre"]);
        assert_eq!(command.query, vec!["artist:band"]);
        assert!(!command.all);
        assert!(!command.album);
    }

    #[test]
    fn album_and_all_flags_parse() {
        let cli = Cli::parse_from(["medit", "edit", "--all", "-a"]);
        let Command::Edit(command) = cli.command;
        assert!(command.all);
        assert!(command.album);
        assert!(command.query.is_empty());
    }

    #[test]
    fn library_path_prefers_config_override() {
        let dirs = AppDirs::discover().expect("dirs");
        let mut config = Config::default();
        assert!(library_path(&config, &dirs).ends_with("library.json"));

        config.library_path = Some(PathBuf::from("/tmp/custom.json"));
        assert_eq!(
            library_path(&config, &dirs),
            PathBuf::from("/tmp/custom.json")
        );
    }
}
