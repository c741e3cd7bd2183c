//! Robot Arena entry point
//!
//! Terminal host: welcome, help, game and game-over screens. Each key press
//! becomes at most one engine command; the screen is redrawn after every
//! input since nothing moves between turns.

use std::fs::File;
use std::io::{self, Write};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use robot_arena::consts::LEVEL_CLEAR_BONUS;
use robot_arena::sim::{
    self, Command, Direction, EntityKind, GameEvent, GameOverCause, GameState, Position,
    in_blast_zone,
};
use robot_arena::{Leaderboard, Settings};

fn main() -> Result<()> {
    let settings = Settings::load(&Settings::default_path());
    init_logging(&settings)?;
    log::info!("Robot Arena starting...");

    let mut app = App::new(settings);
    let mut term = Terminal::begin()?;
    let result = app.run(&mut term);
    term.end()?;
    result
}

/// Raw mode owns stderr, so logs go to a file or nowhere
fn init_logging(settings: &Settings) -> Result<()> {
    let default_filter = if settings.log_file.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));

    if let Some(path) = &settings.log_file {
        let file = File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

/* -----------------------------
   Terminal
------------------------------ */

struct Terminal {
    out: io::Stdout,
}

impl Terminal {
    fn begin() -> Result<Self> {
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))
            .context("entering alternate screen")?;
        terminal::enable_raw_mode().context("enabling raw mode")?;
        Ok(Self { out })
    }

    fn end(&mut self) -> Result<()> {
        execute!(self.out, ResetColor, cursor::Show, LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }
}

/* -----------------------------
   Screens
------------------------------ */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HelpTab {
    HowToPlay,
    Controls,
    Scoring,
}

impl HelpTab {
    const ALL: [HelpTab; 3] = [HelpTab::HowToPlay, HelpTab::Controls, HelpTab::Scoring];

    fn next(self) -> Self {
        match self {
            HelpTab::HowToPlay => HelpTab::Controls,
            HelpTab::Controls => HelpTab::Scoring,
            HelpTab::Scoring => HelpTab::HowToPlay,
        }
    }

    fn title(self) -> &'static str {
        match self {
            HelpTab::HowToPlay => "How to Play [h]",
            HelpTab::Controls => "Controls [c]",
            HelpTab::Scoring => "Scoring [s]",
        }
    }

    fn lines(self) -> &'static [&'static str] {
        match self {
            HelpTab::HowToPlay => &[
                "You are trapped in a sealed arena with robots that hunt you.",
                "You have no weapon but movement: make the robots crash.",
                "",
                "- Robots step toward you (diagonals too) after each of your moves",
                "- Two or more robots on one cell become radioactive junk (**)",
                "- Robots walking into junk are wrecked",
                "- Obstacles (##) stop robots; junk and obstacles kill you",
                "",
                "Tools (restocked every level):",
                "- Teleporter: jump to a random free cell (-2 points)",
                "- EMP: robots freeze for 5 turns",
                "- Blaster: destroy every robot in a 3x3 zone",
                "  (standing in the zone is fatal)",
                "",
                "Clear every robot to reach the next, harder level.",
                "There is no final level: only a score to beat.",
            ],
            HelpTab::Controls => &[
                "Arrow keys / hjkl   move",
                "t                   teleport",
                "e                   EMP",
                "b                   arm blaster, press again to fire",
                "esc                 cancel blaster",
                "q                   quit",
                "r                   restart (after game over)",
                "",
                "While the blaster is armed, movement keys aim the 3x3 zone.",
                "",
                "@@ you   RR robot   ## obstacle   ** junk   ░░ blast zone",
            ],
            HelpTab::Scoring => &[
                "Destroyed robot     +10 x multiplier",
                "Level cleared       +50",
                "Teleport            -2",
                "",
                "Every 5 kills in a level add +1x to the multiplier:",
                "kills 1-4 score 1x, 5-9 score 2x, 10-14 score 3x, ...",
                "The streak resets when a new level starts.",
                "",
                "The best 10 games are kept on the leaderboard.",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Summary {
    cause: GameOverCause,
    level: u32,
    score: i64,
    rank: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
enum Screen {
    Welcome,
    Help(HelpTab),
    Playing,
    GameOver(Summary),
}

/* -----------------------------
   App
------------------------------ */

struct App {
    settings: Settings,
    leaderboard: Leaderboard,
    player_name: String,
    rng: Pcg32,
    screen: Screen,
    game: Option<GameState>,
    message: String,
}

impl App {
    fn new(settings: Settings) -> Self {
        let rng = match settings.seed {
            Some(seed) => {
                log::info!("Using seed {}", seed);
                Pcg32::seed_from_u64(seed)
            }
            None => Pcg32::from_os_rng(),
        };

        Self {
            leaderboard: Leaderboard::new(settings.scores_path.clone()),
            player_name: settings.effective_player_name(),
            settings,
            rng,
            screen: Screen::Welcome,
            game: None,
            message: String::new(),
        }
    }

    fn run(&mut self, term: &mut Terminal) -> Result<()> {
        loop {
            self.render(&mut term.out).context("drawing screen")?;

            match event::read().context("reading terminal input")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !self.handle_key(key) {
                        return Ok(());
                    }
                }
                // Resize and friends: just redraw
                _ => {}
            }
        }
    }

    /// Returns false when the player quits
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return false;
        }

        match self.screen {
            Screen::Welcome => match key.code {
                KeyCode::Char('h') => self.screen = Screen::Help(HelpTab::HowToPlay),
                KeyCode::Char('c') => self.screen = Screen::Help(HelpTab::Controls),
                KeyCode::Char('s') => self.screen = Screen::Help(HelpTab::Scoring),
                KeyCode::Char('q') | KeyCode::Esc => return false,
                _ => self.start_game(),
            },
            Screen::Help(tab) => match key.code {
                KeyCode::Tab => self.screen = Screen::Help(tab.next()),
                KeyCode::Char('q') | KeyCode::Esc => self.screen = Screen::Welcome,
                _ => {}
            },
            Screen::Playing => match key.code {
                KeyCode::Char('q') => return false,
                code => {
                    if let Some(command) = command_for(code) {
                        self.play(command);
                    }
                }
            },
            Screen::GameOver(_) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return false,
                KeyCode::Char('r') => self.start_game(),
                _ => {}
            },
        }
        true
    }

    fn start_game(&mut self) {
        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        let (width, height) = self.settings.arena_size(cols, rows);

        match GameState::new(width, height, self.settings.difficulty, &mut self.rng) {
            Ok(state) => {
                self.game = Some(state);
                self.screen = Screen::Playing;
                self.message.clear();
            }
            Err(err) => {
                log::warn!("Could not start a game: {}", err);
                self.message = format!("Cannot start: {err}. Try a larger terminal.");
                self.screen = Screen::Welcome;
            }
        }
    }

    fn play(&mut self, command: Command) {
        let Some(game) = self.game.as_mut() else {
            return;
        };

        let events = sim::apply(game, command, &mut self.rng);
        self.message = if events.is_empty() {
            rejection_message(command, game)
        } else {
            events
                .iter()
                .filter_map(event_message)
                .next_back()
                .unwrap_or_default()
        };

        let ended = events.iter().find_map(|event| match *event {
            GameEvent::GameOver {
                cause,
                level,
                score,
            } => Some((cause, level, score)),
            _ => None,
        });
        if let Some((cause, level, score)) = ended {
            self.finish(cause, level, score);
        }
    }

    fn finish(&mut self, cause: GameOverCause, level: u32, score: i64) {
        let rank = match self.leaderboard.save(&self.player_name, level, score) {
            Ok(rank) => rank,
            Err(err) => {
                log::warn!(
                    "Could not save score to {}: {}",
                    self.leaderboard.path().display(),
                    err
                );
                None
            }
        };

        self.screen = Screen::GameOver(Summary {
            cause,
            level,
            score,
            rank,
        });
    }

    /* -----------------------------
       Rendering
    ------------------------------ */

    fn render(&self, out: &mut impl Write) -> io::Result<()> {
        let (cols, _) = terminal::size().unwrap_or((80, 24));
        queue!(out, Clear(ClearType::All), cursor::MoveTo(0, 0))?;

        match self.screen {
            Screen::Welcome => self.render_welcome(out, cols)?,
            Screen::Help(tab) => render_help(out, tab)?,
            Screen::Playing => {
                if let Some(game) = &self.game {
                    render_game(out, game, &self.message)?;
                }
            }
            Screen::GameOver(summary) => render_game_over(out, cols, &summary)?,
        }

        out.flush()
    }

    fn render_welcome(&self, out: &mut impl Write, cols: u16) -> io::Result<()> {
        centered(out, cols, 2, "ROBOT ARENA", Color::Red)?;
        centered(
            out,
            cols,
            4,
            &format!("Welcome, {}", self.player_name),
            Color::Grey,
        )?;

        let top = self.leaderboard.top_n(self.settings.welcome_scores);
        if !top.is_empty() {
            let scores: Vec<String> = top
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{}. {} Lvl{} {}pts", i + 1, s.name, s.level, s.score))
                .collect();
            centered(
                out,
                cols,
                6,
                &format!("TOP SCORES: {}", scores.join(" | ")),
                Color::Yellow,
            )?;
        }

        centered(
            out,
            cols,
            8,
            "[h] How to Play  [c] Controls  [s] Scoring",
            Color::DarkGrey,
        )?;
        centered(
            out,
            cols,
            9,
            "Press any other key to start, [q] to quit",
            Color::DarkGrey,
        )?;

        if !self.message.is_empty() {
            centered(out, cols, 11, &self.message, Color::Red)?;
        }
        Ok(())
    }
}

fn command_for(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Some(Command::Move(Direction::Up)),
        KeyCode::Down | KeyCode::Char('j') => Some(Command::Move(Direction::Down)),
        KeyCode::Left | KeyCode::Char('h') => Some(Command::Move(Direction::Left)),
        KeyCode::Right | KeyCode::Char('l') => Some(Command::Move(Direction::Right)),
        KeyCode::Char('t') => Some(Command::Teleport),
        KeyCode::Char('e') => Some(Command::Emp),
        KeyCode::Char('b') => Some(Command::Blaster),
        KeyCode::Esc => Some(Command::Cancel),
        _ => None,
    }
}

fn rejection_message(command: Command, game: &GameState) -> String {
    if game.is_targeting() && matches!(command, Command::Teleport | Command::Emp) {
        return "Blaster armed: [b] fire, [esc] cancel".to_string();
    }
    match command {
        Command::Teleport if game.tools.teleports == 0 => "No teleports left".to_string(),
        Command::Teleport => "No free cell to teleport to".to_string(),
        Command::Emp => "No EMPs left".to_string(),
        Command::Blaster => "No blasters left".to_string(),
        Command::Move(_) | Command::Cancel => String::new(),
    }
}

fn event_message(event: &GameEvent) -> Option<String> {
    match *event {
        GameEvent::RobotsMerged { count, points, .. } => {
            Some(format!("{count} robots collided (+{points})"))
        }
        GameEvent::RobotWrecked { .. } => Some("A robot crashed into junk".to_string()),
        GameEvent::Teleported { .. } => Some("Teleported (-2)".to_string()),
        GameEvent::EmpActivated { turns } => Some(format!("EMP! Robots frozen for {turns} turns")),
        GameEvent::BlasterFired { kills, points, .. } => {
            Some(format!("Blaster destroyed {kills} robots (+{points})"))
        }
        GameEvent::LevelAdvanced { level } => Some(format!(
            "Level {level}! +{LEVEL_CLEAR_BONUS} points, tools restocked"
        )),
        _ => None,
    }
}

fn centered(out: &mut impl Write, cols: u16, row: u16, text: &str, color: Color) -> io::Result<()> {
    let width = text.chars().count() as u16;
    let col = cols.saturating_sub(width) / 2;
    queue!(
        out,
        cursor::MoveTo(col, row),
        SetForegroundColor(color),
        Print(text),
        ResetColor
    )
}

fn render_help(out: &mut impl Write, active: HelpTab) -> io::Result<()> {
    queue!(out, cursor::MoveTo(2, 0))?;
    for tab in HelpTab::ALL {
        let color = if tab == active {
            Color::Yellow
        } else {
            Color::DarkGrey
        };
        queue!(out, SetForegroundColor(color), Print(tab.title()), Print("    "))?;
    }
    queue!(out, ResetColor)?;

    let lines = active.lines();
    for (i, line) in lines.iter().enumerate() {
        queue!(out, cursor::MoveTo(2, 2 + i as u16), Print(line))?;
    }

    queue!(
        out,
        cursor::MoveTo(2, 3 + lines.len() as u16),
        SetForegroundColor(Color::DarkGrey),
        Print("Tab: switch | q: back"),
        ResetColor
    )
}

fn glyph(kind: EntityKind) -> (&'static str, Color) {
    match kind {
        EntityKind::Robot => ("RR", Color::Red),
        EntityKind::Obstacle => ("##", Color::DarkGrey),
        EntityKind::Junk => ("**", Color::Yellow),
        EntityKind::Shrub => ("&&", Color::DarkGreen),
    }
}

fn render_game(out: &mut impl Write, game: &GameState, message: &str) -> io::Result<()> {
    let width = game.width as usize;
    let mut grid: Vec<Option<EntityKind>> = vec![None; width * game.height as usize];
    for entity in &game.entities {
        if game.in_bounds(entity.position) {
            grid[entity.position.y as usize * width + entity.position.x as usize] = Some(entity.kind);
        }
    }
    let target = game.blaster_target();

    let border = format!("+{}+", "-".repeat(width * 2));
    queue!(
        out,
        cursor::MoveTo(0, 0),
        SetForegroundColor(Color::DarkGrey),
        Print(&border),
        ResetColor
    )?;

    for y in 0..game.height {
        queue!(
            out,
            cursor::MoveTo(0, 1 + y as u16),
            SetForegroundColor(Color::DarkGrey),
            Print("|"),
        )?;
        for x in 0..game.width {
            let pos = Position::new(x, y);
            let (text, color) = if pos == game.player {
                ("@@", Color::Green)
            } else {
                match grid[y as usize * width + x as usize] {
                    Some(kind) => glyph(kind),
                    None => ("  ", Color::Reset),
                }
            };

            let zoned = target.is_some_and(|t| in_blast_zone(t, pos));
            match (zoned, text) {
                (true, "  ") => queue!(out, SetForegroundColor(Color::DarkGrey), Print("░░"))?,
                (true, _) => queue!(
                    out,
                    SetBackgroundColor(Color::DarkGrey),
                    SetForegroundColor(color),
                    Print(text),
                    SetBackgroundColor(Color::Reset)
                )?,
                (false, _) => queue!(out, SetForegroundColor(color), Print(text))?,
            }
        }
        queue!(out, SetForegroundColor(Color::DarkGrey), Print("|"), ResetColor)?;
    }

    let status_row = 1 + game.height as u16;
    queue!(
        out,
        cursor::MoveTo(0, status_row),
        SetForegroundColor(Color::DarkGrey),
        Print(&border),
        cursor::MoveTo(1, status_row + 1),
        Print(format!(
            "Level: {}  Score: {}  [t] Teleports: {}  [e] EMPs: {}",
            game.level, game.score, game.tools.teleports, game.tools.emps
        )),
    )?;
    if game.emp_turns_left > 0 {
        queue!(
            out,
            SetForegroundColor(Color::Yellow),
            Print(format!(" (ACTIVE: {} turns)", game.emp_turns_left)),
            SetForegroundColor(Color::DarkGrey),
        )?;
    }
    queue!(out, Print(format!("  [b] Blasters: {}", game.tools.blasters)))?;
    if game.is_targeting() {
        queue!(
            out,
            SetForegroundColor(Color::Yellow),
            Print(" [TARGETING - b: fire, esc: cancel]"),
        )?;
    }
    queue!(
        out,
        SetForegroundColor(Color::DarkGrey),
        Print("  [q] Quit"),
        cursor::MoveTo(1, status_row + 2),
        SetForegroundColor(Color::Grey),
        Print(message),
        ResetColor
    )
}

fn render_game_over(out: &mut impl Write, cols: u16, summary: &Summary) -> io::Result<()> {
    centered(out, cols, 3, "GAME OVER", Color::Red)?;

    let reason = match summary.cause {
        GameOverCause::SelfDestruct => "You are your own worst enemy!".to_string(),
        GameOverCause::Caught => "A robot caught you.".to_string(),
        GameOverCause::Collided(kind) => format!("You ran into the {}.", kind.as_str()),
    };
    centered(out, cols, 5, &reason, Color::DarkRed)?;
    centered(
        out,
        cols,
        7,
        &format!("Level: {}  Score: {}", summary.level, summary.score),
        Color::Grey,
    )?;
    if let Some(rank) = summary.rank {
        centered(
            out,
            cols,
            8,
            &format!("New high score: #{rank}"),
            Color::Yellow,
        )?;
    }
    centered(out, cols, 10, "[r] Restart  [q] Quit", Color::DarkGrey)
}
