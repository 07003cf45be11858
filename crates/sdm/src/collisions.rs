//! Stochastic collision-coalescence and breakup of super-droplet pairs,
//! following the Monte Carlo scheme of Shima et al. 2009.
//!
//! Each gridbox independently shuffles its resident droplets into random
//! disjoint pairs, computes a scaled pair probability from the configured
//! kernel and enacts coalescence or breakup with an integer event
//! multiplicity `gamma`. Sampling within a gridbox is serial; gridboxes run
//! in parallel, each with its own deterministic random stream.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::constants as c;
use crate::errors::SdmError;
use crate::gridbox::Gridbox;
use crate::kernels::CollisionKernel;
use crate::motion::TerminalVelocity;
use crate::superdrop::Superdrop;
use crate::transport;

/// Configuration of the collision process.
#[derive(Clone, Copy, Debug)]
pub struct CollisionConfig {
    pub kernel: CollisionKernel,
    /// Terminal velocity formula used by the hydrodynamic kernels.
    pub terminalv: TerminalVelocity,
    /// Enact collision-breakup for collisions that do not coalesce.
    pub do_breakup: bool,
    /// Expected number of fragments per real-droplet collision-breakup.
    pub nfrags: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            kernel: CollisionKernel::default(),
            terminalv: TerminalVelocity::Simmel,
            do_breakup: false,
            nfrags: 5.0,
        }
    }
}

/// The collision process over one collision substep of (real) length
/// `delt` seconds.
#[derive(Clone, Copy, Debug)]
pub struct Collisions {
    config: CollisionConfig,
}

impl Collisions {
    pub fn new(config: CollisionConfig) -> Result<Self, SdmError> {
        if config.do_breakup && config.nfrags < 1.0 {
            return Err(SdmError::Config(format!(
                "breakup requires nfrags >= 1 so the largest fragment cannot exceed the \
                 colliding mass, got {}",
                config.nfrags
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Run collisions on every gridbox in parallel. `delt` is the real
    /// collision timestep in seconds; `t` and `seed` derive each gridbox's
    /// private random stream.
    pub fn run(
        &self,
        t: u64,
        seed: u64,
        delt: f64,
        gridboxes: &[Gridbox],
        supers: &mut [Superdrop],
    ) -> Result<(), SdmError> {
        let spans = transport::disjoint_spans(gridboxes, supers)?;
        gridboxes.par_iter().zip(spans).for_each(|(gbx, drops)| {
            let mut rng = collision_rng(seed, gbx.index, t);
            let volume = gbx.state.volume * c::VOL0;
            self.collide_in_gridbox(&mut rng, delt, volume, drops);
        });
        Ok(())
    }

    /// Shuffle the droplets of one gridbox into random pairs and collide
    /// each pair, assuming they all share the (real) volume `volume` [m^3].
    fn collide_in_gridbox(
        &self,
        rng: &mut ChaCha8Rng,
        delt: f64,
        volume: f64,
        drops: &mut [Superdrop],
    ) {
        // inert droplets (zero multiplicity) are excluded from sampling
        let mut order: Vec<usize> = (0..drops.len()).filter(|&i| !drops[i].is_inert()).collect();
        let nsupers = order.len();
        if nsupers < 2 {
            return;
        }
        order.shuffle(rng);

        // Shima et al. 2009 correction for sampling only floor(N/2) of the
        // N(N-1)/2 distinct pairs
        let nhalf = nsupers / 2;
        let scale_p = nsupers as f64 * (nsupers as f64 - 1.0) / (2.0 * nhalf as f64);

        for pair in order.chunks_exact(2) {
            let (drop_a, drop_b) = index_pair_mut(drops, pair[0], pair[1]);
            self.collide_pair(rng, scale_p, delt, volume, drop_a, drop_b);
        }
    }

    /// Monte Carlo step for one random pair.
    fn collide_pair(
        &self,
        rng: &mut ChaCha8Rng,
        scale_p: f64,
        delt: f64,
        volume: f64,
        drop_a: &mut Superdrop,
        drop_b: &mut Superdrop,
    ) {
        // order the pair so drop1 carries the larger multiplicity
        let (drop1, drop2) = if drop_a.xi >= drop_b.xi {
            (drop_a, drop_b)
        } else {
            (drop_b, drop_a)
        };

        // without breakup the coalescence efficiency weights the pair
        // probability itself; with breakup it instead decides the outcome
        // of an enacted collision
        let mut prob_jk =
            self.config
                .kernel
                .pair_probability(drop1, drop2, self.config.terminalv, delt, volume);
        if !self.config.do_breakup {
            prob_jk *=
                self.config
                    .kernel
                    .coalescence_efficiency(drop1, drop2, self.config.terminalv);
        }
        let prob = scale_p * drop1.xi as f64 * prob_jk;

        let phi: f64 = rng.gen();
        let gamma = event_gamma(drop1.xi, drop2.xi, prob, phi);
        if gamma == 0 {
            return;
        }

        if self.config.do_breakup {
            let coaleff =
                self.config
                    .kernel
                    .coalescence_efficiency(drop1, drop2, self.config.terminalv);
            if rng.gen::<f64>() < coaleff {
                coalesce_pair(gamma, drop1, drop2);
            } else {
                breakup_pair(self.config.nfrags, drop1, drop2);
            }
        } else {
            coalesce_pair(gamma, drop1, drop2);
        }
    }
}

/// Deterministic per-(seed, gridbox, tick) random stream, so parallel
/// gridboxes never share a generator and reruns are bit-identical.
fn collision_rng(seed: u64, gbx_index: u32, t: u64) -> ChaCha8Rng {
    let mut s = seed
        ^ (gbx_index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
        ^ t.wrapping_mul(0xd1b5_4a32_d192_ed03);
    s ^= s >> 30;
    s = s.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    s ^= s >> 27;
    ChaCha8Rng::seed_from_u64(s)
}

/// Two distinct mutable droplets out of one slice.
fn index_pair_mut(drops: &mut [Superdrop], i: usize, j: usize) -> (&mut Superdrop, &mut Superdrop) {
    debug_assert_ne!(i, j);
    if i < j {
        let (head, tail) = drops.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = drops.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

/// Integer event multiplicity: `floor(prob)` plus one with probability of
/// the remainder, clipped so drop1's multiplicity cannot go negative.
/// Assumes `xi1 >= xi2`.
fn event_gamma(xi1: u64, xi2: u64, prob: f64, phi: f64) -> u64 {
    let mut gamma = prob.floor() as u64;
    if phi < prob - prob.floor() {
        gamma += 1;
    }
    gamma.min(xi1 / xi2)
}

fn radius_cubed(drop: &Superdrop) -> f64 {
    drop.radius * drop.radius * drop.radius
}

/// Enact `gamma`-fold coalescence on a pair with `xi1 >= xi2`, following
/// Shima et al. 2009 section 5.1.3 part (5).
fn coalesce_pair(gamma: u64, drop1: &mut Superdrop, drop2: &mut Superdrop) {
    let xi1 = drop1.xi;
    let xi2 = drop2.xi;
    debug_assert!(gamma <= xi1 / xi2);

    if xi1 > gamma * xi2 {
        // option (a): drop2 absorbs gamma droplets' worth of drop1
        drop1.xi = xi1 - gamma * xi2;
        let new_rcubed = radius_cubed(drop2) + gamma as f64 * radius_cubed(drop1);
        drop2.radius = new_rcubed.powf(1.0 / 3.0);
        drop2.m_sol += gamma as f64 * drop1.m_sol;
    } else {
        // option (b): xi1 == gamma * xi2 makes twin super-droplets of the
        // merged state, splitting the multiplicity as evenly as integers
        // allow (xi2 == 1 leaves drop1 with zero multiplicity: inert)
        let new_xi = xi2 / 2;
        let new_rcubed = radius_cubed(drop2) + gamma as f64 * radius_cubed(drop1);
        let new_radius = new_rcubed.powf(1.0 / 3.0);
        let new_m_sol = drop2.m_sol + gamma as f64 * drop1.m_sol;

        drop1.xi = new_xi;
        drop2.xi = xi2 - new_xi;
        drop1.radius = new_radius;
        drop2.radius = new_radius;
        drop1.m_sol = new_m_sol;
        drop2.m_sol = new_m_sol;
    }
}

/// Enact collision-breakup on a pair with `xi1 >= xi2` (gamma of 1
/// implicitly): the colliding droplets shatter into
/// `round(nfrags * xi2)` fragments sharing the colliding water volume and
/// solute.
fn breakup_pair(nfrags: f64, drop1: &mut Superdrop, drop2: &mut Superdrop) {
    let xi1 = drop1.xi;
    let xi2 = drop2.xi;
    let sumr3 = radius_cubed(drop1) + radius_cubed(drop2);
    let sum_msol = drop1.m_sol + drop2.m_sol;
    let totfrags = (nfrags * xi2 as f64).round().max(1.0) as u64;

    if xi1 == xi2 {
        // twin outcome: both super-droplets become fragments
        let new_xi1 = totfrags / 2;
        let new_xi2 = totfrags - new_xi1;
        let new_radius = (xi2 as f64 * sumr3 / totfrags as f64).powf(1.0 / 3.0);
        let new_m_sol = xi2 as f64 * sum_msol / totfrags as f64;

        drop1.xi = new_xi1;
        drop2.xi = new_xi2;
        drop1.radius = new_radius;
        drop2.radius = new_radius;
        drop1.m_sol = new_m_sol;
        drop2.m_sol = new_m_sol;
    } else {
        // drop2 becomes the fragments of xi2 real collisions, decrementing
        // drop1's multiplicity
        drop1.xi = xi1 - xi2;
        drop2.xi = totfrags;
        drop2.radius = (xi2 as f64 * sumr3 / totfrags as f64).powf(1.0 / 3.0);
        drop2.m_sol = xi2 as f64 * sum_msol / totfrags as f64;
    }
}
