use kiln_basic_types::H256;
use tiny_keccak::{Hasher, Keccak};

/// Hash under which contract bytecode is stored. Bytecode is content-addressed: equal code
/// hashes to the same reference no matter which account it is deployed at.
pub fn hash_bytecode(code: &[u8]) -> H256 {
    let mut hasher = Keccak::v256();
    hasher.update(code);
    let mut output = [0_u8; 32];
    hasher.finalize(&mut output);
    output.into()
}
