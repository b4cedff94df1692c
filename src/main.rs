use anyhow::{Context, Result, bail};
use clap::Parser;

use xatmos::cli::{AbridgeArgs, Cli, Command, InspectArgs};
use xatmos::color;
use xatmos::data::filter::Abridger;
use xatmos::data::loader::{load_orders, load_reference_spectrum};
use xatmos::molecules::Molecule;
use xatmos::pipeline::{MoleculeOutcome, run_batch};
use xatmos::registry::MoleculeRegistry;
use xatmos::view::{ViewWindow, nearest_line, selected_overlays};

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Abridge(args) => abridge(&args),
        Command::Molecules => {
            for m in Molecule::all() {
                println!("{:>2}  {:<7} {}", m.number, m.name, m.isotopes.join(","));
            }
            Ok(())
        }
        Command::Inspect(args) => inspect(&args),
    }
}

fn abridge(args: &AbridgeArgs) -> Result<()> {
    let params = args.resolve_params()?;
    let molecules = args.resolve_molecules()?;
    let source = args.line_source()?;

    let reference = load_reference_spectrum(&args.reference)
        .with_context(|| format!("loading reference {}", args.reference.display()))?;
    if reference.is_empty() {
        bail!("reference spectrum {} has no samples", args.reference.display());
    }
    log::info!(
        "reference: {} samples, curves {:?}",
        reference.len(),
        reference.curves.keys().collect::<Vec<_>>()
    );
    let abridger = Abridger::new(&reference.wavenumber, params)?;
    log::info!(
        "{} coverage ranges, halfwidth {}, max_ratio {}",
        abridger.ranges().len(),
        params.halfwidth,
        params.max_ratio
    );
    for range in abridger.ranges() {
        log::debug!("coverage {range}");
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    for outcome in run_batch(&source, &abridger, &molecules, &args.out_dir) {
        if let MoleculeOutcome::Written { name, before, after, .. } = &outcome {
            println!("{name} {before} {after}");
        } else {
            println!("{outcome}");
        }
    }
    Ok(())
}

fn inspect(args: &InspectArgs) -> Result<()> {
    let mut registry = MoleculeRegistry::discover(&args.dir)?;
    if registry.is_empty() {
        log::warn!("no abridged tables in {}", args.dir.display());
    }
    if args.molecules.is_empty() {
        registry.select_all();
    } else {
        for name in &args.molecules {
            if !registry.select(name) {
                log::warn!("no abridged table for {name} in {}", args.dir.display());
            }
        }
    }

    let mut window = ViewWindow {
        central_wavenumber: args.center,
        bandwidth: args.bandwidth,
    };
    window.pan(args.pan);
    let (lo, hi) = window.xlim();
    println!("window {lo:.4} – {hi:.4} cm-1");

    if let Some(path) = &args.orders {
        for order in load_orders(path)? {
            if window.contains(order.start) || window.contains(order.end) {
                println!("order {:.4} – {:.4}", order.start, order.end);
            }
        }
    }

    let overlays = selected_overlays(&mut registry, &window)?;
    for overlay in &overlays {
        let color = registry
            .color(&overlay.molecule)
            .map(color::hex)
            .unwrap_or_default();
        println!("{} {color} ({} lines)", overlay.molecule, overlay.sticks.len());
        for stick in &overlay.sticks {
            println!("  {:12.5} {:.4}", stick.wavenumber, stick.height);
        }
    }

    if let Some(pick) = &args.pick {
        let &[x, y] = pick.as_slice() else {
            bail!("--pick expects X,Y, got {} values", pick.len());
        };
        match nearest_line(&overlays, x, y, args.aspect) {
            Some(hit) => println!("nearest: {}", hit.label()),
            None => println!("nearest: none"),
        }
    }
    Ok(())
}
