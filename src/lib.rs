// src/lib.rs
//! Supersingular isogeny Diffie-Hellman (SIDH) key exchange.
//!
//! Two parties walk isogeny graphs of supersingular Montgomery curves over
//! Fp² from a shared base curve, one through 2-power degree isogenies and the
//! other through 3-power degree isogenies. Each publishes its image curve
//! together with the images of the peer's torsion basis, and both arrive at
//! the same j-invariant.
//!
//! ```no_run
//! use sidh::{config_for, KeyGenerator, OsRandom, Role, Sidh};
//!
//! # fn main() -> sidh::Result<()> {
//! let params = config_for("SIDHp434")?;
//! let generator = KeyGenerator::new(params);
//! let (alice_private, alice_public) = generator.generate(Role::Alice, &mut OsRandom)?;
//! let (bob_private, bob_public) = generator.generate(Role::Bob, &mut OsRandom)?;
//!
//! let sidh = Sidh::new(params);
//! let alice_secret = sidh.derive_shared_secret(&alice_private, &bob_public)?;
//! let bob_secret = sidh.derive_shared_secret(&bob_private, &alice_public)?;
//! assert_eq!(alice_secret, bob_secret);
//! # Ok(())
//! # }
//! ```

pub mod arithmetic;
pub mod curves;
pub mod errors;
pub mod params;
pub mod protocols;
pub mod random;

pub use errors::{ArithmeticFault, ErrorClass, Result, ResultExt, SidhError};
pub use params::{config_for, ParameterDefinition, ParameterSet, Role};
pub use protocols::key_exchange::{KeyGenerator, Sidh};
pub use protocols::keys::{PrivateKey, PublicKey, SharedSecret};
pub use random::{OsRandom, RandomSource};
