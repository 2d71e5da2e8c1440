use std::path::PathBuf;

/// One line of user input, parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Toggle play/pause, or play the track at the given index.
    Play(Option<usize>),
    Next,
    Prev,
    /// Seek to a fraction (0.0..=1.0) of the current track.
    Seek(f64),
    Volume(i32),
    Shuffle,
    Favorite,
    Add(Vec<PathBuf>),
    Folder(PathBuf),
    Remove(usize),
    Delete(usize),
    Tag(usize, Vec<TagField>),
    Scan { deep: bool, roots: Vec<PathBuf> },
    CancelScan,
    List,
    Albums,
    Artists,
    Search(String),
    Now,
    Help,
    Quit,
}

/// A single `key=value` assignment of a `tag` command.
#[derive(Debug, Clone, PartialEq)]
pub enum TagField {
    Title(String),
    Artists(String),
    Album(String),
    Year(String),
    Cover(PathBuf),
}

pub const HELP: &str = "\
commands:
  play [N]            toggle play/pause, or play track N
  next | prev         skip forward / back
  seek F              jump to fraction F (0.0-1.0) of the track
  vol N               set volume 0-100
  shuffle | fav       toggle shuffle / favorite of the current track
  add PATH...         add audio files
  folder DIR          add every audio file below DIR
  remove N            drop track N from the library
  delete N            move track N to the trash
  tag N k=v|k=v...    edit tags (title, artists, album, year, cover)
  scan [deep] [DIR..] rescan the given or configured folders
  cancel              cancel a running scan
  list | albums | artists | search TEXT | now
  quit";

fn index_arg(arg: Option<&str>, cmd: &str) -> Result<usize, String> {
    let arg = arg.ok_or_else(|| format!("{cmd}: missing track number"))?;
    arg.parse()
        .map_err(|_| format!("{cmd}: not a track number: {arg}"))
}

fn parse_tag_fields(raw: &str) -> Result<Vec<TagField>, String> {
    let mut fields = Vec::new();
    for part in raw.split('|').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| format!("tag: expected key=value, got {part}"))?;
        let value = value.trim().to_string();
        let field = match key.trim() {
            "title" => TagField::Title(value),
            "artist" | "artists" => TagField::Artists(value),
            "album" => TagField::Album(value),
            "year" => TagField::Year(value),
            "cover" => TagField::Cover(PathBuf::from(value)),
            other => return Err(format!("tag: unknown field {other}")),
        };
        fields.push(field);
    }
    if fields.is_empty() {
        return Err("tag: nothing to change".into());
    }
    Ok(fields)
}

/// Parse one input line. Empty lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (cmd, rest) = line
        .split_once(char::is_whitespace)
        .map(|(c, r)| (c, r.trim()))
        .unwrap_or((line, ""));
    let mut args = rest.split_whitespace();

    let command = match cmd {
        "play" | "p" => match args.next() {
            None => Command::Play(None),
            Some(n) => Command::Play(Some(index_arg(Some(n), cmd)?)),
        },
        "next" | "n" => Command::Next,
        "prev" | "b" => Command::Prev,
        "seek" => {
            let f = args.next().ok_or("seek: missing fraction")?;
            let f: f64 = f.parse().map_err(|_| format!("seek: not a number: {f}"))?;
            Command::Seek(f)
        }
        "vol" | "volume" => {
            let v = args.next().ok_or("vol: missing value")?;
            Command::Volume(v.parse().map_err(|_| format!("vol: not a number: {v}"))?)
        }
        "shuffle" => Command::Shuffle,
        "fav" | "favorite" => Command::Favorite,
        "add" => {
            if rest.is_empty() {
                return Err("add: missing path".into());
            }
            Command::Add(args.map(PathBuf::from).collect())
        }
        "folder" => {
            if rest.is_empty() {
                return Err("folder: missing directory".into());
            }
            Command::Folder(PathBuf::from(rest))
        }
        "remove" | "rm" => Command::Remove(index_arg(args.next(), cmd)?),
        "delete" => Command::Delete(index_arg(args.next(), cmd)?),
        "tag" => {
            let (n, fields) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let n = index_arg(Some(n).filter(|s| !s.is_empty()), cmd)?;
            Command::Tag(n, parse_tag_fields(fields)?)
        }
        "scan" => {
            let mut deep = false;
            let mut roots = Vec::new();
            for arg in args {
                if arg == "deep" {
                    deep = true;
                } else {
                    roots.push(PathBuf::from(arg));
                }
            }
            Command::Scan { deep, roots }
        }
        "cancel" => Command::CancelScan,
        "list" | "ls" => Command::List,
        "albums" => Command::Albums,
        "artists" => Command::Artists,
        "search" | "/" => Command::Search(rest.to_string()),
        "now" => Command::Now,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(command))
}
