use codrcon::{Client, ClientConfig};
use log::{debug, Level, LevelFilter, Metadata, Record};
use std::{env, error::Error, time::Duration};

const USAGE: &str = "usage: codrcon <host> <port> <command> [args...]

commands:
  status                    map and player table
  info                      getinfo query
  serverinfo                getstatus query
  get <dvar>                read a dvar
  set <dvar> <value...>     write a dvar
  say <message...>          broadcast a message
  tell <num> <message...>   private message to a client slot
  kick <player> <reason...> kick with a reason
  raw <command...>          any other console command

environment:
  RCON_PASSWORD    rcon password (required)
  RCON_TIMEOUT_MS  read timeout in milliseconds (default 1000)
  RCON_LOG         error, warn, info, debug or trace (default info)";

struct SimpleLogger {
    level: Level,
}

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logger() {
    let level = env::var("RCON_LOG")
        .ok()
        .and_then(|v| v.parse::<Level>().ok())
        .unwrap_or(Level::Info);
    let logger = Box::leak(Box::new(SimpleLogger { level }));
    let _ = log::set_logger(logger).map(|()| log::set_max_level(LevelFilter::Trace));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logger();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 3 {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }
    let (host, port, command, rest) = (&args[0], &args[1], args[2].as_str(), &args[3..]);

    let password = env::var("RCON_PASSWORD").unwrap_or_default();
    let mut config = ClientConfig::default();
    if let Some(ms) = env::var("RCON_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    {
        config = config.with_read_timeout(Duration::from_millis(ms));
    }

    let client = Client::connect_with_config(host, port, &password, config).await?;
    debug!("connected to {}:{}", client.host(), client.port());

    let result = run(&client, command, rest).await;
    client.close().await?;
    result
}

async fn run(client: &Client, command: &str, rest: &[String]) -> Result<(), Box<dyn Error>> {
    let joined = rest.join(" ");
    match command {
        "status" => {
            let status = client.status().await?;
            println!("map: {}", status.map);
            for p in &status.players {
                println!(
                    "{:>3} {:>5} {:>4} {:<32} {}:{} {}",
                    p.client_num, p.score, p.ping, p.name, p.ip, p.port, p.guid
                );
            }
        }
        "info" => println!("{:#?}", client.get_info().await?),
        "serverinfo" => println!("{:#?}", client.get_status().await?),
        "get" => println!("{}", client.get_dvar(&joined).await?),
        "set" if rest.len() >= 2 => client.set_dvar(&rest[0], &rest[1..].join(" ")).await?,
        "say" => client.say(&joined).await?,
        "tell" if rest.len() >= 2 => {
            let num: u32 = rest[0].parse()?;
            client.tell(num, &rest[1..].join(" ")).await?
        }
        "kick" if rest.len() >= 2 => client.kick(&rest[0], &rest[1..].join(" ")).await?,
        "raw" if !rest.is_empty() => {
            let args = rest[1..].join(" ");
            let lines = client
                .send_command(&rest[0], Some(&args), Default::default())
                .await?;
            for line in lines {
                println!("{}", line);
            }
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
    Ok(())
}
