use clap::{Parser, Subcommand};
use bazaar_agent::RegistryClient;
use bazaar_core::{Registration, ServiceInstance};

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(about = "Bazaar registry and gateway administrative CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "BAZAAR_REGISTRY_URL", default_value = "http://localhost:3000")]
    registry: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Register (or refresh) a service instance
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "localhost")]
        host: String,
        #[arg(long)]
        port: u16,
        /// Repeatable capability/route hint
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Repeatable key=value metadata entry
        #[arg(long = "meta", value_parser = parse_meta)]
        metadata: Vec<(String, String)>,
    },
    /// Remove an instance by id
    Deregister {
        id: String,
    },
    /// List healthy instances of a service
    Discover {
        name: String,
    },
    /// Pick the next healthy instance of a service
    Instance {
        name: String,
    },
    /// Show gateway status overview
    Status,
    /// Show every known service with its instances
    Roster,
    /// Print the static route catalog
    Routes {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let client = RegistryClient::new(cli.registry);

    match cli.command {
        Commands::Register { name, id, host, port, tags, metadata } => {
            let mut registration = Registration::new(name, id.clone(), host, port).with_tags(tags);
            for (key, value) in metadata {
                registration.add_metadata(key, value);
            }
            client.register(&registration).await?;
            println!("Instance registered: {}", id);
        }
        Commands::Deregister { id } => {
            if client.deregister(&id).await? {
                println!("Instance deregistered: {}", id);
            } else {
                println!("No instance with id {}", id);
            }
        }
        Commands::Discover { name } => {
            let instances = client.discover(&name).await?;
            print_instances(&instances);
        }
        Commands::Instance { name } => match client.healthy_instance(&name).await? {
            Some(instance) => print_instances(&[instance]),
            None => println!("No healthy instances of {}", name),
        },
        Commands::Status => {
            let Some(status) = client.gateway_status().await? else {
                return Err("gateway returned no status".into());
            };

            println!("{} v{} - {:?}", status.gateway, status.version, status.status);
            println!("{}", "=".repeat(60));
            println!("{:<24} {:<10} {:<10} {:<10}", "Service", "Instances", "Healthy", "Status");
            println!("{}", "-".repeat(60));
            for (name, summary) in &status.services {
                println!(
                    "{:<24} {:<10} {:<10} {:<10}",
                    name,
                    summary.instance_count,
                    summary.healthy_instances,
                    format!("{:?}", summary.status)
                );
            }
        }
        Commands::Roster => {
            for (name, instances) in client.roster().await? {
                println!("{} ({})", name, instances.len());
                print_instances(&instances);
                println!();
            }
        }
        Commands::Routes { json } => {
            let routes = client.routes().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&routes)?);
            } else {
                for service in routes {
                    println!("{} [{}]", service.service, service.base_url);
                    for endpoint in service.endpoints {
                        println!("  {}", endpoint);
                    }
                }
            }
        }
    }

    Ok(())
}

fn parse_meta(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got `{}`", raw)),
    }
}

fn print_instances(instances: &[ServiceInstance]) {
    println!("{:<24} {:<28} {:<22} {:<8}", "Service", "ID", "Address", "Healthy");
    println!("{}", "-".repeat(84));
    for inst in instances {
        println!(
            "{:<24} {:<28} {:<22} {:<8}",
            inst.service_name,
            inst.service_id,
            inst.address(),
            inst.is_healthy
        );
    }
}
