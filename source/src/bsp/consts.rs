use flagset::flags;

pub const VALVE_HEADER_LUMPS: usize = 64;
pub const RESPAWN_HEADER_LUMPS: usize = 128;

// upper design bounds
pub const MAX_MAP_DISP_POWER: u32 = 4;

// Max # of neighboring displacement touching a displacement's corner.
pub const MAX_DISP_CORNER_NEIGHBORS: usize = 4;

pub const fn num_disp_power_verts(power: u32) -> usize {
    ((1 << (power)) + 1) * ((1 << (power)) + 1)
}
pub const fn num_disp_power_tris(power: u32) -> usize {
    (1 << (power)) * (1 << (power)) * 2
}

pub const MAX_MAP_MODELS: usize = 1024;
pub const MAX_MAP_TEXINFO: usize = 12288;
pub const MAX_MAP_TEXDATA: usize = 2048;
pub const MAX_MAP_DISPINFO: usize = 2048;
pub const MAX_MAP_DISP_VERTS: usize = MAX_MAP_DISPINFO * num_disp_power_verts(MAX_MAP_DISP_POWER);
pub const MAX_MAP_DISP_TRIS: usize = num_disp_power_tris(MAX_MAP_DISP_POWER);
// Planes come in pairs, thus an even number.
pub const MAX_MAP_PLANES: usize = 65536;
pub const MAX_MAP_VERTS: usize = 65536;
pub const MAX_MAP_FACES: usize = 65536;
pub const MAX_MAP_EDGES: usize = 256000;
pub const MAX_MAP_SURFEDGES: usize = 512000;
pub const MAX_MAP_TEXDATA_STRING_TABLE: usize = 65536;

pub const TEXTURE_NAME_LENGTH: usize = 128;
pub const STATIC_PROP_NAME_LENGTH: usize = 128;

flags! {
    pub enum Contents: i32 {
        EMPTY = 0,             //N.o contents
        SOLID = 0x1,           //an eye is never valid in a solid
        WINDOW = 0x2,          //translucent, but not watery (glass)
        AUX = 0x4,             //
        GRATE = 0x8, //alpha-tested "grate" textures. Bullets/sight pass through, but solids don't
        SLIME = 0x10, //
        WATER = 0x20, //
        MIST = 0x40, //
        OPAQUE = 0x80, //	block AI line of sight
        TESTFOGVOLUME = 0x100, //things that cannot be seen through (may be non-solid though)
        TEAM1 = 0x800, //per team contents used to differentiate collisions between players and objects on different teams
        TEAM2 = 0x1000,
        IgnoreNodrawOpaque = 0x2000, //ignore CONTENTS_OPAQUE on surfaces that have SURF_NODRAW
        MOVEABLE = 0x4000,             //hits entities which are MOVETYPE_PUSH (doors, plats, etc.)
        AREAPORTAL = 0x8000,           //remaining contents are non-visible, and don't eat brushes
        PLAYERCLIP = 0x10000,          //
        MONSTERCLIP = 0x20000,         //
        ORIGIN = 0x1000000,       //	removed before bsping an entity
        MONSTER = 0x2000000,      //	should never be on a brush, only in game
        DEBRIS = 0x4000000,       //
        DETAIL = 0x8000000,       //	brushes to be added after vis leafs
        TRANSLUCENT = 0x10000000, // 	auto set if any surface has trans
        LADDER = 0x20000000,      //
        HITBOX = 0x40000000,      // 	use accurate hitboxes on trace
    }
}

#[cfg(test)]
mod consts_tests {
    use super::*;

    #[test]
    fn disp_power_counts() {
        assert_eq!(num_disp_power_verts(1), 9);
        assert_eq!(num_disp_power_tris(1), 8);
        assert_eq!(num_disp_power_verts(MAX_MAP_DISP_POWER), 289);
        assert_eq!(MAX_MAP_DISP_TRIS, 512);
    }
}
