use plt_reader::{DecodeOptions, PltReader};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path-to-plt-file> [--parallel]", args[0]);
        std::process::exit(1);
    }

    let plt_path = &args[1];
    let options = DecodeOptions {
        parallel: args.iter().any(|arg| arg == "--parallel"),
    };

    println!("Reading Tecplot file: {}", plt_path);
    println!("{}", "=".repeat(60));

    let reader = match PltReader::open(plt_path) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("\nERROR: Failed to read header");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    let header = &reader.header;
    println!("\nHeader Information:");
    println!("  Version: {}", header.version);
    println!("  File type: {:?}", header.file_type);
    println!("  Title: {}", header.title);
    println!("  Variables ({}): {}", header.num_vars(), header.variable_names.join(", "));
    println!("  Zones: {}", header.zones.len());
    for aux in &header.aux_data {
        println!("  Aux: {} = {}", aux.name, aux.value);
    }

    match reader.read_data_with(&options) {
        Ok(data) => {
            for zone in &data.zones {
                let descriptor = header.zones.get(zone.index);
                println!("\nZone {}: '{}'", zone.index, zone.name);
                if let Some(descriptor) = descriptor {
                    println!(
                        "  {} | time {} | strand {}",
                        descriptor.zone_type, descriptor.solution_time, descriptor.strand_id
                    );
                }
                for variable in &zone.variables {
                    let note = if variable.passive {
                        " (passive)".to_string()
                    } else if let Some(source) = variable.shared_from {
                        format!(" (shared from zone {})", source)
                    } else {
                        String::new()
                    };
                    match variable.range {
                        Some((min, max)) => println!(
                            "  {:<16} {:?} x{} [{}, {}]{}",
                            variable.name,
                            variable.format,
                            variable.values.len(),
                            min,
                            max,
                            note
                        ),
                        None => println!(
                            "  {:<16} {:?} x{}{}",
                            variable.name,
                            variable.format,
                            variable.values.len(),
                            note
                        ),
                    }
                }
            }

            println!("\n{}", "=".repeat(60));
            println!("SUCCESS! Decoded {} zones.", data.len());
        }
        Err(e) => {
            eprintln!("\nERROR: Failed to decode data section");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
