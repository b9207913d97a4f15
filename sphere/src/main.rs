use oxivec::{FloatVectorSpecies, Parameter, VectorIndividual};
use oxivec_params::ParameterDatabase;

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

/// Mutation-only hill climbing on the sphere function.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Parameter file (`key = value` lines, or TOML).
    #[arg(long)]
    params: PathBuf,
    /// Parameter override, may be repeated.
    #[arg(short = 'p', value_name = "KEY=VALUE")]
    overrides: Vec<String>,
    #[arg(long, default_value_t = 200)]
    generations: usize,
    /// Offspring mutated from the champion each generation.
    #[arg(long, default_value_t = 32)]
    offspring: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Key under which the species is configured.
    #[arg(long, default_value = "pop.subpop.0.species")]
    base: String,
}

fn sphere(genome: &[f64]) -> f64 {
    genome.iter().map(|g| g * g).sum()
}

fn fitness(individual: &VectorIndividual<f64>) -> f64 {
    individual.fitness.unwrap_or(f64::INFINITY)
}

// Every offspring gets its own generator so results do not
// depend on how rayon schedules the work.
fn offspring_rng(seed: u64, generation: usize, index: usize, offspring: usize) -> StdRng {
    let stream = (generation * offspring + index) as u64 + 1;
    StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut params = ParameterDatabase::load(&args.params)?;
    for assignment in &args.overrides {
        params.apply_override(assignment)?;
    }
    let species = FloatVectorSpecies::<f64>::setup(&params, &Parameter::new(args.base.as_str()))?;
    info!(
        "{} genes, {} offspring over {} generations",
        species.genome_size(),
        args.offspring,
        args.generations
    );

    let mut champion = species.new_individual(&mut StdRng::seed_from_u64(args.seed));
    champion.fitness = Some(sphere(&champion.genome));

    for generation in 0..args.generations {
        let best = (0..args.offspring)
            .into_par_iter()
            .map(|index| {
                let mut rng = offspring_rng(args.seed, generation, index, args.offspring);
                let mut child = VectorIndividual::new(champion.genome.clone());
                species.mutate_genome(&mut child.genome, &mut rng);
                child.fitness = Some(sphere(&child.genome));
                child
            })
            .min_by(|a, b| fitness(a).total_cmp(&fitness(b)));

        if let Some(best) = best {
            if fitness(&best) < fitness(&champion) {
                info!("generation {}: {:.6}", generation, fitness(&best));
                champion = best;
            } else {
                debug!("generation {}: no improvement", generation);
            }
        }
    }

    debug_assert!(species.in_bounds(&champion.genome));
    println!("{}", champion);
    println!("{}", ron::to_string(&champion)?);
    Ok(())
}
