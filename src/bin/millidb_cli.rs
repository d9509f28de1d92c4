use clap::Parser;
use std::{error::Error, io};

use millidb::{Client, ClientConfig, Collection, Command, FileError, prompt};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host name or address of the MilliDB server
    host: String,
    /// Port of the MilliDB server
    port: u16,
    /// Name of the user that is used to access the files
    user: String,
    /// Password of the user that is used to access the files
    password: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize env_logger; For logging to STDOUT/STDERR
    env_logger::init();

    let cli = Cli::parse();
    let client = Client::connect(&ClientConfig::new(cli.host, cli.port, cli.user, cli.password))?;

    // Names of the collections entered so far; resolved from the root on
    // every command so the shell never acts on a stale node.
    let mut location: Vec<String> = Vec::new();

    loop {
        match prompt(io::stdin().lock(), io::stdout().lock()) {
            Ok(Command::Exit) => break,
            Ok(cmd) => {
                if let Err(e) = run(&client, &mut location, cmd) {
                    eprintln!("error: {e}");
                }
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    client.close();
    Ok(())
}

fn run(client: &Client, location: &mut Vec<String>, command: Command) -> Result<(), FileError> {
    match command {
        Command::Exit => Ok(()),
        Command::List => {
            for file in current(client, location)?.files()? {
                let kind = if file.is_document() { "doc" } else { "col" };
                println!("{kind}  {}", file.name());
            }
            Ok(())
        }
        Command::Enter(name) => {
            current(client, location)?.collection(&name)?;
            location.push(name);
            Ok(())
        }
        Command::Up => {
            location.pop();
            Ok(())
        }
        Command::Get { document, sub_path } => {
            let value = current(client, location)?
                .document(&document)?
                .get(&sub_path)?;
            println!("{value}");
            Ok(())
        }
        Command::Set {
            document,
            sub_path,
            value,
        } => current(client, location)?
            .document(&document)?
            .set(&sub_path, value),
        Command::Delete(name) => {
            let collection = current(client, location)?;
            for file in collection.files()? {
                if file.name() == name {
                    return file.delete();
                }
            }
            Err(FileError::OperationFailed {
                path: collection.path(),
                function: millidb::Function::Delete,
            })
        }
    }
}

/// Resolve the current collection from the root, re-verifying each level
/// against the server.
fn current(client: &Client, location: &[String]) -> Result<Collection, FileError> {
    let mut collection = client.root().clone();
    for name in location {
        collection = collection.collection(name)?;
    }
    Ok(collection)
}
