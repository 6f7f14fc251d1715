//! Line-oriented front end driving the [`Shell`].
//!
//! One command per line; the session watchdog ticks on the same loop via
//! `select!`, so a revoked session surfaces within one poll interval even
//! while the prompt is idle.

use std::error::Error;
use std::io::Write;
use std::path::Path;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};
use ledger::{Role, SessionCheck, TransactionKind};
use shell::{CloudStatus, Shell, ShellError};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::time::{Duration, MissedTickBehavior, interval};

const SESSION_POLL: Duration = Duration::from_secs(4);

type LineReader = Lines<BufReader<tokio::io::Stdin>>;

enum Flow {
    Continue,
    Quit,
}

pub async fn run(mut shell: Shell) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut watchdog = interval(SESSION_POLL);
    watchdog.set_missed_tick_behavior(MissedTickBehavior::Delay);

    println!("mizan: chat-text bookkeeping. Type `help` for commands.");

    let mut show_prompt = true;
    loop {
        if !shell.is_logged_in() {
            if !login(&mut shell, &mut lines).await? {
                return Ok(());
            }
            watchdog.reset();
            print_status(&shell);
            show_prompt = true;
        }

        if show_prompt {
            print!("mizan> ");
            std::io::stdout().flush()?;
            show_prompt = false;
        }

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { return Ok(()) };
                match dispatch(&mut shell, line.trim(), &mut lines).await {
                    Ok(Flow::Quit) => return Ok(()),
                    Ok(Flow::Continue) => {}
                    Err(err) => println!("error: {err}"),
                }
                show_prompt = true;
            }
            _ = watchdog.tick() => {
                match shell.session_check() {
                    Ok(SessionCheck::Active) => {}
                    Ok(SessionCheck::Revoked) => {
                        println!();
                        println!(
                            "security alert: this account was opened from another \
                             window or device; you have been logged out."
                        );
                    }
                    Ok(SessionCheck::Gone) => {
                        println!();
                        println!("this account no longer exists; you have been logged out.");
                    }
                    Err(err) => tracing::warn!("session check failed: {err}"),
                }
            }
        }
    }
}

/// Interactive login. Returns `false` on end of input.
async fn login(
    shell: &mut Shell,
    lines: &mut LineReader,
) -> Result<bool, Box<dyn Error + Send + Sync>> {
    loop {
        print!("username: ");
        std::io::stdout().flush()?;
        let Some(username) = lines.next_line().await? else {
            return Ok(false);
        };
        let username = username.trim().to_string();
        if username.is_empty() {
            continue;
        }

        let password = prompt_password("password: ")?;

        match shell.login(&username, &password).await {
            Ok(()) => {
                if let Some(user) = shell.current_user() {
                    println!("welcome, {}", user.username);
                }
                return Ok(true);
            }
            Err(err @ ShellError::InvalidCredentials) => println!("{err}"),
            Err(err) => println!("login failed: {err}"),
        }
    }
}

async fn dispatch(
    shell: &mut Shell,
    line: &str,
    lines: &mut LineReader,
) -> Result<Flow, Box<dyn Error + Send + Sync>> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "help" => print_help(),
        "add" => {
            if rest.is_empty() {
                println!("usage: add <free chat text>");
            } else {
                // Extraction failure keeps the input text: it is echoed back
                // so the user can fix and resend it.
                match shell.process_text(rest).await {
                    Ok(added) => {
                        println!("added {} transaction(s):", added.len());
                        for tx in &added {
                            print_transaction(tx);
                        }
                        print_status(shell);
                    }
                    Err(err) => {
                        println!("error: {err}");
                        println!("your text was kept: {rest}");
                    }
                }
            }
        }
        "in" | "out" => manual_entry(shell, command, rest).await?,
        "list" => {
            if shell.transactions().is_empty() {
                println!("the ledger is empty; paste chat text with `add`.");
            }
            for tx in shell.transactions() {
                print_transaction(tx);
            }
        }
        "summary" => {
            for summary in shell.summaries() {
                println!(
                    "{:<6} in {:>14.2}  out {:>14.2}  balance {:>14.2}  = {:>10.2} $",
                    summary.currency.as_str(),
                    summary.total_incoming,
                    summary.total_outgoing,
                    summary.balance,
                    summary.usd_value,
                );
            }
            println!("total balance: {:.2} $", shell.total_usd_balance());
        }
        "rates" => {
            for (code, rate) in shell.rates().iter() {
                println!("{:<6} {rate} / USD", code.as_str());
            }
        }
        "rate" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next().and_then(|raw| raw.parse::<f64>().ok())) {
                (Some(code), Some(value)) => {
                    shell.set_rate(code, value).await?;
                    print_status(shell);
                }
                _ => println!("usage: rate <code> <positive number>"),
            }
        }
        "sync" => {
            shell.cloud_sync().await?;
            print_status(shell);
        }
        "refresh" => {
            if shell.refresh_from_cloud().await? {
                println!("replaced local data with the cloud copy");
            } else {
                println!("cloud unreachable; local data kept");
            }
            print_status(shell);
        }
        "delete" => {
            if rest.is_empty() {
                println!("usage: delete <transaction id>");
            } else {
                shell.delete_transaction(rest).await?;
                println!("deleted {rest}");
            }
        }
        "clear" => {
            if confirm(lines, "wipe the whole ledger? this cannot be undone.").await? {
                shell.clear_transactions().await?;
                println!("ledger cleared");
                print_status(shell);
            }
        }
        "export" => {
            if rest.is_empty() {
                println!("usage: export <path.csv>");
            } else {
                shell.export_csv(Path::new(rest))?;
                println!("exported {} transaction(s) to {rest}", shell.transactions().len());
            }
        }
        "users" => {
            for account in shell.list_accounts()? {
                println!(
                    "{:<24} {:<10} {:<8} {}",
                    account.id,
                    account.username,
                    match account.role {
                        Role::Admin => "admin",
                        Role::User => "user",
                    },
                    if account.active_session_id.is_some() {
                        "online"
                    } else {
                        "-"
                    },
                );
            }
        }
        "useradd" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(username), Some(password)) => {
                    let role = match parts.next() {
                        Some("admin") => Role::Admin,
                        _ => Role::User,
                    };
                    let account = shell.create_account(username, password, role)?;
                    println!("created account {} ({})", account.username, account.id);
                }
                _ => println!("usage: useradd <username> <password> [admin]"),
            }
        }
        "userdel" => {
            if rest.is_empty() {
                println!("usage: userdel <account id>");
            } else if confirm(
                lines,
                "delete this account and all of its financial data?",
            )
            .await?
            {
                shell.delete_account(rest)?;
                println!("deleted account {rest}");
            }
        }
        "logout" => {
            shell.logout()?;
            println!("logged out");
        }
        "quit" | "exit" => return Ok(Flow::Quit),
        other => println!("unknown command \"{other}\"; type `help`"),
    }

    Ok(Flow::Continue)
}

async fn manual_entry(
    shell: &mut Shell,
    command: &str,
    rest: &str,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut parts = rest.splitn(3, char::is_whitespace);
    let amount = parts.next().and_then(|raw| raw.parse::<f64>().ok());
    let currency = parts.next();
    let description = parts.next().unwrap_or("").trim();

    let (Some(amount), Some(currency)) = (amount, currency) else {
        println!("usage: {command} <amount> <currency> [description]");
        return Ok(());
    };

    let kind = if command == "in" {
        TransactionKind::Incoming
    } else {
        TransactionKind::Outgoing
    };
    let tx = shell.add_transaction(kind, amount, currency, description).await?;
    print_transaction(&tx);
    print_status(shell);
    Ok(())
}

async fn confirm(
    lines: &mut LineReader,
    question: &str,
) -> Result<bool, Box<dyn Error + Send + Sync>> {
    print!("{question} type `yes` to confirm: ");
    std::io::stdout().flush()?;
    let answer = lines.next_line().await?;
    Ok(matches!(answer, Some(answer) if answer.trim().eq_ignore_ascii_case("yes")))
}

fn print_transaction(tx: &ledger::Transaction) {
    println!(
        "  {:<8} {:>14} {:<6} {:<32} {}",
        tx.kind.as_str(),
        tx.amount,
        tx.currency.as_str(),
        tx.description,
        tx.id,
    );
}

fn print_status(shell: &Shell) {
    let status = match shell.cloud_status() {
        CloudStatus::Idle => "idle",
        CloudStatus::Connected => "connected",
        CloudStatus::Synced => "saved",
        CloudStatus::Error => "error",
    };
    match shell.current_user() {
        Some(user) => println!("[user: {} | cloud: {status}]", user.username),
        None => println!("[cloud: {status}]"),
    }
}

fn print_help() {
    println!("commands:");
    println!("  add <text>                    extract transactions from chat text");
    println!("  in|out <amount> <code> [desc] record one transaction manually");
    println!("  list / summary / rates        show the ledger, balances, rates");
    println!("  rate <code> <value>           set an exchange rate (units per USD)");
    println!("  sync / refresh                push to / pull from the cloud");
    println!("  delete <id> / clear           remove one / all transactions");
    println!("  export <path.csv>             spreadsheet export");
    println!("  users / useradd / userdel     account administration (admin)");
    println!("  logout / quit");
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, std::io::Error> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Reads a password without echoing it (stars only).
fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                return Err("login interrupted".into());
            }
            KeyCode::Char(c) => {
                buf.push(c);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}
