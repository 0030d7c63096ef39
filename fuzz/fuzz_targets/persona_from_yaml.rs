#![no_main]

use libfuzzer_sys::fuzz_target;
use rand::rngs::StdRng;
use rand::SeedableRng;
use troupe_persona::Persona;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(persona) = Persona::from_yaml(source) else {
        return;
    };

    assert_eq!(persona.system_prompt, persona.system_prompt.trim());

    // Policy evaluation must hold up against arbitrary parsed rule sets.
    let mut rng = StdRng::seed_from_u64(0);
    let _ = persona.should_respond("is anyone around?", "U0FUZZ", &mut rng);
    assert!(!persona.should_respond("talking to myself", &persona.name, &mut rng));
});
