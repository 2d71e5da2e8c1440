use std::fs;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use medley::app::App;
use medley::config;
use medley::library::{ScanEvent, TagEdit, display_line, parse_artists};

use super::command::{self, Command, HELP, TagField};

/// Read stdin on its own thread so the loop can keep ticking between lines.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Main loop: handles input lines, scanner events and the playback timer.
/// Returns when the user quits or stdin closes.
pub fn run(settings: &config::Settings, app: &mut App) -> Result<(), Box<dyn std::error::Error>> {
    let input = spawn_stdin_reader();
    let poll = Duration::from_millis(settings.playback.poll_interval_ms);

    loop {
        match input.recv_timeout(poll) {
            Ok(line) => match command::parse(&line) {
                Ok(Some(cmd)) => {
                    if handle_command(cmd, app) {
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(msg) => println!("{msg}"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("stdin closed");
                return Ok(());
            }
        }

        for ev in app.poll_scan() {
            match ev {
                ScanEvent::Progress(pct) => println!("scan: {pct}%"),
                ScanEvent::Status(msg) => println!("{msg}"),
                ScanEvent::Finished(_) => println!("{}", app.status()),
            }
        }

        if let Err(e) = app.tick() {
            println!("{e}");
        }
    }
}

fn print_tracks(app: &App, paths: &[std::path::PathBuf]) {
    for path in paths {
        let meta = app.metadata_of(path);
        let pos = app.index().position(path).unwrap_or_default();
        println!("{pos:>4}  {}", display_line(&meta.title, &meta.artists));
    }
}

fn track_path(app: &App, index: usize) -> Option<std::path::PathBuf> {
    let path = app.index().get(index).map(|p| p.to_path_buf());
    if path.is_none() {
        println!("no track #{index}");
    }
    path
}

fn build_edit(app: &App, path: &std::path::Path, fields: Vec<TagField>) -> Option<TagEdit> {
    let current = app.metadata_of(path);
    let mut edit = TagEdit {
        title: current.title,
        artists: current.artists,
        album: current.album,
        year: current.year,
        cover: None,
    };
    for field in fields {
        match field {
            TagField::Title(v) => edit.title = v,
            TagField::Artists(v) => edit.artists = parse_artists(&v),
            TagField::Album(v) => edit.album = v,
            TagField::Year(v) => edit.year = v,
            TagField::Cover(p) => match fs::read(&p) {
                Ok(bytes) => edit.cover = Some(bytes),
                Err(e) => {
                    println!("cannot read {}: {e}", p.display());
                    return None;
                }
            },
        }
    }
    Some(edit)
}

/// Apply one command. Returns `true` when the loop should exit.
fn handle_command(cmd: Command, app: &mut App) -> bool {
    let result = match cmd {
        Command::Quit => return true,
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Play(None) => app.play_pause(),
        Command::Play(Some(n)) => app.play_track(n),
        Command::Next => app.next(),
        Command::Prev => app.prev(),
        Command::Seek(f) => {
            app.seek(f);
            Ok(())
        }
        Command::Volume(v) => {
            app.set_volume(v);
            println!("volume {}", app.session().volume());
            Ok(())
        }
        Command::Shuffle => {
            let on = app.toggle_shuffle();
            println!("shuffle {}", if on { "on" } else { "off" });
            Ok(())
        }
        Command::Favorite => app.toggle_favorite().map(|on| {
            println!("{}", if on { "favorited" } else { "unfavorited" });
        }),
        Command::Add(paths) => {
            app.add_tracks(&paths);
            println!("{}", app.status());
            Ok(())
        }
        Command::Folder(dir) => {
            app.add_folder(&dir);
            println!("{}", app.status());
            Ok(())
        }
        Command::Remove(n) => {
            if let Some(path) = track_path(app, n) {
                app.remove_track(&path);
            }
            Ok(())
        }
        Command::Delete(n) => match track_path(app, n) {
            Some(path) => app.delete_track(&path),
            None => Ok(()),
        },
        Command::Tag(n, fields) => match track_path(app, n) {
            Some(path) => match build_edit(app, &path, fields) {
                Some(edit) => app.edit_tags(&path, &edit),
                None => Ok(()),
            },
            None => Ok(()),
        },
        Command::Scan { deep, roots } => {
            let roots = (!roots.is_empty()).then_some(roots);
            app.start_scan(roots, deep);
            Ok(())
        }
        Command::CancelScan => {
            app.cancel_scan();
            Ok(())
        }
        Command::List => {
            print_tracks(app, app.index().all_tracks());
            Ok(())
        }
        Command::Albums => {
            for album in app.index().album_names() {
                let count = app.index().tracks_in_album(album).len();
                println!("{album} ({}, {count} tracks)", app.album_artist(album));
            }
            Ok(())
        }
        Command::Artists => {
            for artist in app.index().artist_names() {
                println!("{artist} ({} tracks)", app.index().tracks_by_artist(artist).len());
            }
            Ok(())
        }
        Command::Search(q) => {
            print_tracks(app, &app.search(&q));
            Ok(())
        }
        Command::Now => {
            match app.now_playing() {
                Some(now) => println!(
                    "[{:?}] #{} {}{}",
                    app.state(),
                    now.index,
                    now.metadata.display(),
                    if now.favorite { " *" } else { "" }
                ),
                None => println!("nothing playing"),
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!("{e}");
        println!("{e}");
    }
    false
}
